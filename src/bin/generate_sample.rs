use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Course {
    title: &'static str,
    department: &'static str,
    /// Typical maximum estimated demand per period.
    base_demand: f64,
}

const COURSES: [Course; 12] = [
    Course { title: "Cálculo Diferencial", department: "MAT", base_demand: 820.0 },
    Course { title: "Cálculo Integral", department: "MAT", base_demand: 540.0 },
    Course { title: "Álgebra Lineal", department: "MAT", base_demand: 460.0 },
    Course { title: "Física Mecánica", department: "FIS", base_demand: 380.0 },
    Course { title: "Física de Campos", department: "FIS", base_demand: 210.0 },
    Course { title: "Programación I", department: "SIS", base_demand: 300.0 },
    Course { title: "Estructuras de Datos", department: "SIS", base_demand: 120.0 },
    Course { title: "Química General", department: "QUI", base_demand: 90.0 },
    Course { title: "Termodinámica", department: "MEC", base_demand: 38.0 },
    Course { title: "Geología Estructural", department: "GEO", base_demand: 24.0 },
    Course { title: "Epistemología", department: "HUM", base_demand: 18.0 },
    Course { title: "Seminario de Grado", department: "HUM", base_demand: 12.0 },
];

struct Row {
    title: String,
    department: String,
    period: i64,
    metrics: [f64; 7],
}

/// One synthetic record: demand drifts upward year over year, the other
/// metrics are derived from it, group counts use capacities 40/30/25.
fn generate_row(course: &Course, period: i64, year_index: usize, rng: &mut SimpleRng) -> Row {
    let drift = 1.0 + 0.03 * year_index as f64;
    let demand = (course.base_demand * drift + rng.gauss(0.0, course.base_demand * 0.08))
        .max(1.0)
        .round();

    let historical = (demand * 0.85 + rng.gauss(0.0, demand * 0.05)).max(0.0).round();
    let projected = (demand * 0.70 + rng.gauss(0.0, demand * 0.05)).max(0.0).round();
    let new_target = (demand * 0.25 + rng.gauss(0.0, demand * 0.04)).max(0.0).round();

    Row {
        title: course.title.to_string(),
        department: course.department.to_string(),
        period,
        metrics: [
            historical,
            projected,
            new_target,
            demand,
            (demand / 40.0).ceil(),
            (demand / 30.0).ceil(),
            (demand / 25.0).ceil(),
        ],
    }
}

fn write_parquet(path: &str, rows: &[Row]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Titulo_Curso", DataType::Utf8, false),
        Field::new("Codigo_Dpto", DataType::Utf8, false),
        Field::new("Periodo", DataType::Int64, false),
        Field::new("Matrícula_Estimada_Historica", DataType::Float64, false),
        Field::new("Proyectados_Actual_(S)", DataType::Float64, false),
        Field::new("Meta_Nuevos", DataType::Float64, false),
        Field::new("Demanda_Max_Estimada", DataType::Float64, false),
        Field::new("Nro_Grupos_40", DataType::Float64, false),
        Field::new("Nro_Grupos_30", DataType::Float64, false),
        Field::new("Nro_Grupos_25", DataType::Float64, false),
    ]));

    let titles = StringArray::from(rows.iter().map(|r| r.title.as_str()).collect::<Vec<_>>());
    let departments = StringArray::from(
        rows.iter()
            .map(|r| r.department.as_str())
            .collect::<Vec<_>>(),
    );
    let periods = Int64Array::from(rows.iter().map(|r| r.period).collect::<Vec<_>>());

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(titles),
        Arc::new(departments),
        Arc::new(periods),
    ];
    for i in 0..7 {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.metrics[i]).collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!("Wrote {} records to {path}", rows.len());
}

fn main() {
    let mut rng = SimpleRng::new(42);

    std::fs::create_dir_all("data").expect("Failed to create data directory");

    for family in [10i64, 30i64] {
        let mut rows = Vec::new();
        for (year_index, year) in (2017i64..=2024).enumerate() {
            let period = year * 100 + family;
            for course in &COURSES {
                rows.push(generate_row(course, period, year_index, &mut rng));
            }
        }
        write_parquet(&format!("data/demand_{family}.parquet"), &rows);
    }
}
