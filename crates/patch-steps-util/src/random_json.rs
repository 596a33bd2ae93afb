use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde_json::{Map, Value};

/// Seeded random JSON generator.
///
/// Uses xoshiro256** so a fixed seed reproduces the exact same sequence of
/// documents, which keeps fuzz-style tests replayable from a failure report.
///
/// # Examples
///
/// ```
/// use patch_steps_util::RandomJson;
///
/// let mut a = RandomJson::new(7);
/// let mut b = RandomJson::new(7);
/// assert_eq!(a.document(), b.document());
/// ```
pub struct RandomJson {
    rng: Xoshiro256StarStar,
}

const KEYS: &[&str] = &[
    "id", "name", "level", "tags", "meta", "items", "count", "label", "flags", "data",
];

const WORDS: &[&str] = &[
    "north", "cave", "ember", "quartz", "drift", "hollow", "gale", "sprig",
];

impl RandomJson {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    /// Generates a document with an object root.
    pub fn document(&mut self) -> Value {
        let mut fields = Map::new();
        for _ in 0..self.rng.gen_range(1..6) {
            let key = self.key();
            let val = self.value(3);
            fields.insert(key, val);
        }
        Value::Object(fields)
    }

    /// Generates an arbitrary value at most `depth` containers deep.
    pub fn value(&mut self, depth: usize) -> Value {
        if depth == 0 || self.rng.gen_bool(0.5) {
            return self.scalar();
        }
        if self.rng.gen_bool(0.5) {
            let len = self.rng.gen_range(0..5);
            Value::Array((0..len).map(|_| self.value(depth - 1)).collect())
        } else {
            let mut fields = Map::new();
            for _ in 0..self.rng.gen_range(0..5) {
                let key = self.key();
                let val = self.value(depth - 1);
                fields.insert(key, val);
            }
            Value::Object(fields)
        }
    }

    fn scalar(&mut self) -> Value {
        match self.rng.gen_range(0..5) {
            0 => Value::Null,
            1 => Value::from(self.rng.gen_bool(0.5)),
            2 => Value::from(self.rng.gen_range(-1000i64..1000)),
            3 => Value::from(self.rng.gen_range(0..100) as f64 / 4.0),
            _ => Value::from(*pick(&mut self.rng, WORDS)),
        }
    }

    fn key(&mut self) -> String {
        (*pick(&mut self.rng, KEYS)).to_string()
    }

    /// Produces a nearby variant of `value`: some leaves changed, some
    /// container entries dropped, replaced, or added. The root keeps its
    /// kind, so an object input always yields an object output.
    pub fn mutate(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(fields) => {
                let mut out = Map::new();
                for (key, val) in fields {
                    match self.rng.gen_range(0..10) {
                        0 => {} // drop the key
                        1 => {
                            let fresh = self.value(2);
                            out.insert(key.clone(), fresh);
                        }
                        2 | 3 => {
                            let mutated = self.mutate(val);
                            out.insert(key.clone(), mutated);
                        }
                        _ => {
                            out.insert(key.clone(), val.clone());
                        }
                    }
                }
                if self.rng.gen_bool(0.3) {
                    let key = self.key();
                    let val = self.value(2);
                    out.insert(key, val);
                }
                Value::Object(out)
            }
            Value::Array(elements) => {
                let mut out = Vec::new();
                for val in elements {
                    match self.rng.gen_range(0..10) {
                        0 => {} // drop the element
                        1 => out.push(self.value(2)),
                        2 | 3 => {
                            let mutated = self.mutate(val);
                            out.push(mutated);
                        }
                        _ => out.push(val.clone()),
                    }
                }
                if self.rng.gen_bool(0.3) {
                    let val = self.value(2);
                    out.push(val);
                }
                Value::Array(out)
            }
            scalar => {
                if self.rng.gen_bool(0.5) {
                    scalar.clone()
                } else {
                    self.scalar()
                }
            }
        }
    }
}

fn pick<'a, T, R: Rng>(rng: &mut R, options: &'a [T]) -> &'a T {
    &options[rng.gen_range(0..options.len())]
}
