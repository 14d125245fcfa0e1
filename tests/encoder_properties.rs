//! Property tests for price prediction feature encoding.

use car_advisor::{
    encoder::{self, encode},
    models::{Condition, FuelType, Transmission, VehicleInput},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_condition() -> impl Strategy<Value = Condition> {
    prop_oneof![
        Just(Condition::Excellent),
        Just(Condition::VeryGood),
        Just(Condition::Good),
        Just(Condition::Fair),
        Just(Condition::Poor),
    ]
}

fn arb_vehicle() -> impl Strategy<Value = VehicleInput> {
    (
        "[A-Za-z ]{0,24}",
        proptest::option::of(1950i32..2040),
        any::<u32>(),
        arb_condition(),
        proptest::option::of(600u32..8000),
        proptest::option::of(50u32..900),
        proptest::option::of(prop_oneof![
            Just(Transmission::Automatic),
            Just(Transmission::Manual),
        ]),
        proptest::option::of(prop_oneof![
            Just(FuelType::Gasoline),
            Just(FuelType::Diesel),
            Just(FuelType::Hybrid),
            Just(FuelType::Electric),
        ]),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(model_name, year, mileage, condition, cc, hp, gearbox, fuel, v)| {
            VehicleInput {
                model_name,
                year,
                mileage,
                condition,
                engine_displacement: cc,
                horsepower: hp,
                transmission: gearbox,
                fuel_type: fuel,
                is_v_engine: v,
                features: BTreeSet::new(),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn mileage_buckets_are_mutually_exclusive(mileage in any::<u32>()) {
        let b = encoder::mileage_buckets(mileage);
        prop_assert!(b.medium + b.high + b.very_high <= 1);
        prop_assert_eq!(b.very_high == 1, mileage > 150_000);
        prop_assert_eq!(b.high == 1, mileage > 100_000 && mileage <= 150_000);
        prop_assert_eq!(b.medium == 1, mileage > 50_000 && mileage <= 100_000);
    }

    #[test]
    fn age_follows_reference_year(year in 1900i32..2100, reference_year in 1900i32..2100) {
        let age = encoder::vehicle_age(year, reference_year);
        if year <= reference_year {
            prop_assert_eq!(i64::from(age), i64::from(reference_year) - i64::from(year));
        } else {
            prop_assert_eq!(age, 0);
        }
        let b = encoder::age_buckets(age);
        prop_assert!(b.medium + b.high + b.very_high <= 1);
    }

    #[test]
    fn unknown_year_is_the_reference_year(
        reference_year in 1900i32..2100,
        year in prop_oneof![Just(None), Just(Some(0))]
    ) {
        let model_year = encoder::model_year(year, reference_year);
        prop_assert_eq!(model_year, reference_year);
        prop_assert_eq!(encoder::vehicle_age(model_year, reference_year), 0);
    }

    #[test]
    fn encoding_is_deterministic(vehicle in arb_vehicle(), reference_year in 2000i32..2040) {
        let first = serde_json::to_vec(&encode(&vehicle, reference_year)).unwrap();
        let second = serde_json::to_vec(&encode(&vehicle, reference_year)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn mileage_per_year_is_always_finite(
        vehicle in arb_vehicle(),
        reference_year in 1900i32..2100
    ) {
        let v = encode(&vehicle, reference_year);
        prop_assert!(v.mileage_per_year.is_finite());
        prop_assert!(v.mileage_per_year >= 0.0);
        prop_assert_eq!(v.accident_impact, 0);
    }

    #[test]
    fn brand_ignores_case(name in "(toyota|honda|ford|bmw|audi|kia) [a-z]{1,10}") {
        prop_assert_eq!(encoder::brand_code(&name), encoder::brand_code(&name.to_uppercase()));
        prop_assert!(encoder::brand_code(&name) > 0);
    }
}

#[test]
fn toyota_in_any_case_is_brand_one() {
    assert_eq!(encoder::brand_code("TOYOTA Corolla"), 1);
    assert_eq!(encoder::brand_code("toyota corolla"), 1);
}
