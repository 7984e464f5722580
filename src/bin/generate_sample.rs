//! Writes `sample_observations.csv`, a fake custom-report export covering the
//! last four weeks. Point `[source] snapshot` at it to run without Postgres.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveTime};

/// Minimal xoshiro256** so the output is reproducible without extra deps.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut z = seed;
        for slot in &mut s {
            z = z.wrapping_add(0x9e3779b97f4a7c15);
            let mut x = z;
            x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
            *slot = x ^ (x >> 31);
        }
        Self { state: s }
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const HEADERS: [&str; 12] = [
    "Date Created",
    "Paddock",
    "Crop",
    "Variety",
    "Pest List",
    "Problem Severity",
    "Activity Comment",
    "Activity Author",
    "Activity Name",
    "Job ID",
    "Season",
    "Property",
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let paddocks = ["North 1", "North 2", "River Flat", "Hill Block", "South 4", "Home"];
    let crops: [(&str, &[&str]); 4] = [
        ("Wheat", &["Scepter", "Mace", "Rockstar"]),
        ("Barley", &["Spartacus", "Compass"]),
        ("Canola", &["Hyola 580CT", "44Y94"]),
        ("Lentils", &["Hurricane XT"]),
    ];
    let pests = ["", "Aphids", "Red legged earth mite", "Diamondback moth", "Snails", "Aphids; Thrips"];
    let severities = ["", "Low", "Moderate", "High"];
    let comments = [
        "Monitor again next week",
        "Below threshold, no action",
        "Spray recommended, see job",
        "Patchy emergence along the eastern fence line",
        "",
    ];
    let authors = ["J. Nguyen", "S. Patel", "M. Walker"];

    let today = Local::now().date_naive();
    let output_path = "sample_observations.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(HEADERS)?;

    let n_rows = 120;
    for job_id in 0..n_rows {
        let day = today - Duration::days(rng.below(28) as i64);
        let time = NaiveTime::from_hms_opt(6 + rng.below(12) as u32, rng.below(60) as u32, 0)
            .unwrap_or_default();
        let (crop, varieties) = crops[rng.below(crops.len())];

        writer.write_record([
            day.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string(),
            rng.pick(&paddocks).to_string(),
            crop.to_string(),
            rng.pick(varieties).to_string(),
            rng.pick(&pests).to_string(),
            rng.pick(&severities).to_string(),
            rng.pick(&comments).to_string(),
            rng.pick(&authors).to_string(),
            "Crop monitoring".to_string(),
            (1000 + job_id).to_string(),
            today.format("%Y").to_string(),
            "Home Farm".to_string(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {n_rows} observations to {output_path}");
    Ok(())
}
