//! Synthetic values for `$FAKE_DATA$` tokens.
//!
//! The generator is opaque to the rest of the crate. Callers ask for a value by
//! key and store it; they never inspect how it was produced.

use std::fmt::Debug;
use std::sync::Mutex;

use chrono::NaiveDate;
use fake::faker::address::en::{BuildingNumber, CityName, StateName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::phone_number::en::{CellNumber, PhoneNumber};
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::result::{PagewrightError, PagewrightResult};
use crate::temporal::{DateBase, DateExpression, DateTimeFormat, DateUnit};

/// Keys every [`FakeDataSource`] is expected to understand
pub const FAKE_DATA_KEYS: [&str; 18] = [
    "Address Line 1",
    "Street",
    "City",
    "State",
    "Latitude",
    "Longitude",
    "County",
    "Country",
    "Zip Code",
    "Email",
    "Birth Date",
    "SSN",
    "Work Phone",
    "Home Phone",
    "Mobile",
    "Contact Phone",
    "Company Name",
    "Community Name",
];

const HOUSES: [&str; 4] = ["Gryffindor", "Hufflepuff", "Ravenclaw", "Slytherin"];

/// Source of synthetic values
pub trait FakeDataSource: Debug + Send + Sync {
    /// Value for `key`. `today` anchors date-like keys.
    fn generate(&self, key: &str, today: NaiveDate) -> PagewrightResult<String>;
}

/// US-locale generator backed by the `fake` crate
#[derive(Debug)]
pub struct FakerSource {
    rng: Mutex<StdRng>,
}

impl Default for FakerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakerSource {
    /// Generator seeded from system entropy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible generator
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        match self.rng.lock() {
            Ok(mut rng) => f(&mut rng),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

fn digits(rng: &mut StdRng, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn letters(rng: &mut StdRng, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'a' + rng.gen_range(0..26u8)))
        .collect()
}

fn ssn(rng: &mut StdRng) -> String {
    let area = loop {
        let candidate = rng.gen_range(1..900u32);
        if candidate != 666 {
            break candidate;
        }
    };
    let group = rng.gen_range(1..100u32);
    let serial = rng.gen_range(1..10_000u32);
    format!("{area:03}-{group:02}-{serial:04}")
}

fn birth_date(rng: &mut StdRng, today: NaiveDate) -> PagewrightResult<String> {
    let age: i64 = rng.gen_range(25..80);
    let date = DateExpression {
        base: DateBase::Today,
        offset: -age,
        unit: DateUnit::Years,
        format: None,
    }
    .resolve(today)?;
    Ok(date.format(DateTimeFormat::UiDate.pattern()).to_string())
}

impl FakeDataSource for FakerSource {
    fn generate(&self, key: &str, today: NaiveDate) -> PagewrightResult<String> {
        let wanted = key.trim().to_lowercase();
        self.with_rng(|rng| {
            let value = match wanted.as_str() {
                "address line 1" => {
                    let number: String = BuildingNumber().fake_with_rng(rng);
                    let street: String = StreetName().fake_with_rng(rng);
                    format!("{number} {street}")
                }
                "street" => StreetName().fake_with_rng(rng),
                "city" => CityName().fake_with_rng(rng),
                "state" => StateName().fake_with_rng(rng),
                "latitude" => format!("{:.8}", rng.gen_range(-90.0..90.0_f64)),
                "longitude" => format!("{:.8}", rng.gen_range(-180.0..180.0_f64)),
                "county" => {
                    let city: String = CityName().fake_with_rng(rng);
                    format!("{city} County")
                }
                "country" => "USA".to_string(),
                "zip code" => {
                    let zip: String = ZipCode().fake_with_rng(rng);
                    zip.split('-').next().unwrap_or_default().to_string()
                }
                "email" => format!("{}{}@yopmail.com", letters(rng, 4), digits(rng, 2)),
                "birth date" => birth_date(rng, today)?,
                "ssn" => ssn(rng),
                "work phone" | "home phone" => PhoneNumber().fake_with_rng(rng),
                "mobile" => CellNumber().fake_with_rng(rng),
                "contact phone" => digits(rng, 4),
                "company name" => CompanyName().fake_with_rng(rng),
                "community name" => HOUSES
                    .choose(rng)
                    .copied()
                    .unwrap_or(HOUSES[0])
                    .to_string(),
                _ => {
                    return Err(PagewrightError::UnknownFakeDataKey {
                        key: key.to_string(),
                    })
                }
            };
            Ok(value)
        })
    }
}
