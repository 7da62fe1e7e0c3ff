#[derive(Clone, Copy, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Fixture {
    Sales,
}

impl Fixture {
    pub fn json(&self) -> &'static str {
        match self {
            Fixture::Sales => include_str!("sales.json"),
        }
    }
}
