//! Writes a realistic sample census extract for trying out the dashboard:
//! national occupation baselines scaled to each province by population
//! share, with a little deterministic variation, in the long format the
//! loader expects (one row per jurisdiction, occupation and gender).

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

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (province name, population), rough 2021 census figures.
    let provinces: [(&str, u64); 13] = [
        ("Ontario", 14_223_942),
        ("Quebec", 8_501_833),
        ("British Columbia", 5_000_879),
        ("Alberta", 4_262_635),
        ("Manitoba", 1_342_153),
        ("Saskatchewan", 1_132_505),
        ("Nova Scotia", 969_383),
        ("New Brunswick", 775_610),
        ("Newfoundland and Labrador", 510_550),
        ("Prince Edward Island", 154_331),
        ("Northwest Territories", 41_070),
        ("Yukon", 40_232),
        ("Nunavut", 36_858),
    ];
    let national_population: u64 = provinces.iter().map(|(_, p)| p).sum();

    // (raw occupation label as StatCan prints it, national men, national women)
    let occupations: [(&str, u64, u64); 9] = [
        ("1 Business, finance and administration occupations", 1_200_000, 1_900_000),
        ("2 Natural and applied sciences and related occupations", 1_450_000, 450_000),
        ("3 Health occupations", 300_000, 1_300_000),
        ("21301 Mechanical engineers", 52_000, 8_000),
        ("21310 Electrical and electronics engineers", 45_000, 7_000),
        ("21311 Computer engineers (except software engineers and designers)", 28_000, 6_000),
        ("31301 Registered nurses and registered psychiatric nurses", 30_000, 270_000),
        ("42100 Police officers (except commissioned)", 48_000, 16_000),
        ("42101 Firefighters", 30_000, 2_000),
    ];

    let output_path = "sample_census.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["jurisdiction", "occupation", "gender", "count"])
        .expect("Failed to write header");

    let mut rows = 0usize;
    for (label, national_men, national_women) in occupations {
        // Scale the national baseline to each province, then make the
        // Canada rows the exact sum so the aggregate stays consistent.
        let mut canada_men = 0u64;
        let mut canada_women = 0u64;

        for (province, population) in provinces {
            let ratio = population as f64 / national_population as f64;
            let men = (national_men as f64 * ratio * rng.uniform(0.8, 1.2)).round() as u64;
            let women = (national_women as f64 * ratio * rng.uniform(0.8, 1.2)).round() as u64;
            canada_men += men;
            canada_women += women;

            for (gender, count) in [("men", men), ("women", women), ("total", men + women)] {
                let count = count.to_string();
                writer
                    .write_record([province, label, gender, count.as_str()])
                    .expect("Failed to write row");
                rows += 1;
            }
        }

        for (gender, count) in [
            ("men", canada_men),
            ("women", canada_women),
            ("total", canada_men + canada_women),
        ] {
            let count = count.to_string();
            writer
                .write_record(["Canada", label, gender, count.as_str()])
                .expect("Failed to write row");
            rows += 1;
        }
    }

    writer.flush().expect("Failed to flush output file");
    println!(
        "Wrote {rows} rows ({} occupations x {} jurisdictions x 3 genders) to {output_path}",
        occupations.len(),
        provinces.len() + 1
    );
}
