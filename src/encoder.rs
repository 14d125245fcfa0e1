// Price prediction feature encoding.
//
// Turns the vehicle form into the numeric vector the prediction model was
// trained on. Pure and total: missing or odd values fall back to defaults.

use chrono::Datelike;

use crate::models::{Condition, FuelType, PredictionFeatureVector, Transmission, VehicleInput};

pub const DEFAULT_HORSEPOWER: u32 = 150;
pub const DEFAULT_ENGINE_DISPLACEMENT_CC: u32 = 1800;

// Mileage thresholds in miles, upper bound of each bucket is inclusive
const MILEAGE_MEDIUM_ABOVE: u32 = 50_000;
const MILEAGE_HIGH_ABOVE: u32 = 100_000;
const MILEAGE_VERY_HIGH_ABOVE: u32 = 150_000;

// Age thresholds in years
const AGE_MID_ABOVE: u32 = 5;
const AGE_OLD_ABOVE: u32 = 10;
const AGE_VERY_OLD_ABOVE: u32 = 15;

// Ordered manufacturer fragments; the first fragment found in the model name wins.
// Kept in sync with the brand codes the prediction model was trained on.
const BRAND_FRAGMENTS: [(&str, u8); 11] = [
    ("toyota", 1),
    ("honda", 2),
    ("ford", 3),
    ("bmw", 4),
    ("mercedes", 5),
    ("benz", 5),
    ("audi", 6),
    ("hyundai", 7),
    ("kia", 8),
    ("volkswagen", 9),
    ("vw", 9),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buckets {
    pub medium: u8,
    pub high: u8,
    pub very_high: u8,
}

/// Builds the prediction feature vector for `input` as of `reference_year`.
///
/// Identical inputs always give identical vectors; the clock is never read here.
pub fn encode(input: &VehicleInput, reference_year: i32) -> PredictionFeatureVector {
    let vehicle_age = vehicle_age(model_year(input.year, reference_year), reference_year);
    let mileage = mileage_buckets(input.mileage);
    let age = age_buckets(vehicle_age);

    let vector = PredictionFeatureVector {
        mileage_high: mileage.high,
        accident_impact: 0, // not collected on the form
        age_old: age.high,
        mileage_medium: mileage.medium,
        clean_title: clean_title(input.condition),
        mileage_very_high: mileage.very_high,
        vehicle_age,
        hp: input.horsepower.unwrap_or(DEFAULT_HORSEPOWER),
        age_mid: age.medium,
        engine_displacement: input
            .engine_displacement
            .unwrap_or(DEFAULT_ENGINE_DISPLACEMENT_CC),
        brand: brand_code(&input.model_name),
        fuel_type: fuel_type_code(input.fuel_type),
        age_very_old: age.very_high,
        is_v_engine: u8::from(input.is_v_engine.unwrap_or(false)),
        mileage_per_year: mileage_per_year(input.mileage, vehicle_age),
        transmission: transmission_code(input.transmission),
    };
    tracing::debug!(
        model = %input.model_name,
        vehicle_age,
        brand = vector.brand,
        "Encoded prediction features"
    );
    vector
}

// Calendar year used as the reference for vehicle age
pub fn current_model_year() -> i32 {
    chrono::Local::now().year()
}

// An unknown or zero model year counts as a car from the reference year
pub fn model_year(year: Option<i32>, reference_year: i32) -> i32 {
    year.filter(|&y| y != 0).unwrap_or(reference_year)
}

pub fn vehicle_age(year: i32, reference_year: i32) -> u32 {
    let age = i64::from(reference_year) - i64::from(year);
    u32::try_from(age.max(0)).unwrap_or(u32::MAX)
}

// Raw mileage stands in for a brand new car so the ratio never divides by zero
pub fn mileage_per_year(mileage: u32, vehicle_age: u32) -> f64 {
    if vehicle_age > 0 {
        f64::from(mileage) / f64::from(vehicle_age)
    } else {
        f64::from(mileage)
    }
}

pub fn mileage_buckets(mileage: u32) -> Buckets {
    bucketize(
        mileage,
        MILEAGE_MEDIUM_ABOVE,
        MILEAGE_HIGH_ABOVE,
        MILEAGE_VERY_HIGH_ABOVE,
    )
}

// `medium` is the mid bucket, `high` old, `very_high` very old
pub fn age_buckets(vehicle_age: u32) -> Buckets {
    bucketize(vehicle_age, AGE_MID_ABOVE, AGE_OLD_ABOVE, AGE_VERY_OLD_ABOVE)
}

fn bucketize(value: u32, medium_above: u32, high_above: u32, very_high_above: u32) -> Buckets {
    let mut buckets = Buckets::default();
    if value > very_high_above {
        buckets.very_high = 1;
    } else if value > high_above {
        buckets.high = 1;
    } else if value > medium_above {
        buckets.medium = 1;
    }
    buckets
}

pub fn clean_title(condition: Condition) -> u8 {
    u8::from(matches!(condition, Condition::Excellent | Condition::VeryGood))
}

/// Brand code inferred from a free-text model name, 0 when nothing matches.
pub fn brand_code(model_name: &str) -> u8 {
    let name = model_name.to_lowercase();
    BRAND_FRAGMENTS
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map_or(0, |&(_, code)| code)
}

pub fn fuel_type_code(fuel_type: Option<FuelType>) -> u8 {
    match fuel_type {
        Some(FuelType::Gasoline) => 1,
        Some(FuelType::Diesel) => 2,
        Some(FuelType::Hybrid) => 3,
        Some(FuelType::Electric) => 4,
        None => 0,
    }
}

pub fn transmission_code(transmission: Option<Transmission>) -> u8 {
    match transmission {
        Some(Transmission::Automatic) => 1,
        Some(Transmission::Manual) => 2,
        None => 0,
    }
}
