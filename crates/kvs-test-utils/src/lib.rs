//! Testing utilities for KVS workspace
//!
//! Shared fixture types, their mappings and sample inputs.

#![allow(missing_docs)]

use chrono::{Datelike, NaiveDate};
use kvs_core::prelude::*;
use kvs_core::{ClassMapping, CompositeValues};
use kvs_key::KeyValueCollection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pet {
    pub name: Option<String>,
    pub species: Option<String>,
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub birthday: Option<NaiveDate>,
    pub address: Option<Address>,
    pub nicknames: Option<Vec<String>>,
    pub lucky_numbers: Option<Vec<i64>>,
    pub pets: Option<Vec<Pet>>,
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn assemble_date(values: &CompositeValues) -> Result<NaiveDate, String> {
    let year = values.parse::<i32>("Year")?;
    let month = values.parse::<u32>("Month")?;
    let day = values.parse::<u32>("Day")?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("{year}-{month}-{day} is not a calendar date"))
}

/// Mapping of [`Address`]: mandatory street, optional city and zip
pub fn address_members<H: MapMembers<Address>>(helper: H) -> H {
    helper
        .simple(
            "Street",
            |a: &Address| a.street.as_ref(),
            |a, v| a.street = Some(v),
            |m| m.mandatory(),
        )
        .simple("City", |a: &Address| a.city.as_ref(), |a, v| a.city = Some(v), |m| m)
        .simple("Zip", |a: &Address| a.zip.as_ref(), |a, v| a.zip = Some(v), |m| m)
}

/// Mapping of [`Pet`]: mandatory name, optional species and age
pub fn pet_members<H: MapMembers<Pet>>(helper: H) -> H {
    helper
        .simple("Name", |p: &Pet| p.name.as_ref(), |p, v| p.name = Some(v), |m| m.mandatory())
        .simple("Species", |p: &Pet| p.species.as_ref(), |p, v| p.species = Some(v), |m| m)
        .simple("Age", |p: &Pet| p.age.as_ref(), |p, v| p.age = Some(v), |m| m)
}

/// Helper describing [`Person`], before `build()`
///
/// - `Name`: mandatory
/// - `Age`: optional integer
/// - `Birthday`: composite of `Year`, `Month`, `Day`
/// - `Address`: nested class gated by the `HasAddress` flag
/// - `Nicknames`: aggregate collection
/// - `LuckyNumbers`: separate collection
/// - `Pets`: class collection
pub fn person_helper() -> ClassMappingHelper<Person> {
    ClassMappingHelper::<Person>::with_default()
        .simple(
            "Name",
            |p: &Person| p.name.as_ref(),
            |p, v| p.name = Some(v),
            |m| m.mandatory(),
        )
        .simple("Age", |p: &Person| p.age.as_ref(), |p, v| p.age = Some(v), |m| m)
        .composite(
            "Birthday",
            |p: &Person| p.birthday.as_ref(),
            |p, v| p.birthday = Some(v),
            |m| {
                m.component("Year", |d: &NaiveDate| Some(d.year().to_string()))
                    .component("Month", |d: &NaiveDate| Some(d.month().to_string()))
                    .component("Day", |d: &NaiveDate| Some(d.day().to_string()))
                    .deserialize_with(assemble_date)
            },
        )
        .class(
            "Address",
            |p: &Person| p.address.as_ref(),
            |p, v| p.address = Some(v),
            |m| address_members(m.flag("HasAddress")),
        )
        .value_collection(
            "Nicknames",
            |p: &Person| p.nicknames.as_ref(),
            |p, v| p.nicknames = Some(v),
            |m| m.aggregate(),
        )
        .value_collection(
            "LuckyNumbers",
            |p: &Person| p.lucky_numbers.as_ref(),
            |p, v| p.lucky_numbers = Some(v),
            |m| m.separate(),
        )
        .class_collection(
            "Pets",
            |p: &Person| p.pets.as_ref(),
            |p, v| p.pets = Some(v),
            pet_members,
        )
}

pub fn person_mapping() -> ClassMapping<Person> {
    person_helper().build().unwrap()
}

pub fn person_serializer() -> KeyValueSerializer<Person> {
    KeyValueSerializer::new(person_mapping())
}

pub fn sample_person() -> Person {
    Person {
        name: Some("Ann Lee".to_string()),
        age: Some(41),
        birthday: Some(date(1983, 4, 9)),
        address: Some(Address {
            street: Some("1 Main St".to_string()),
            city: Some("Oslo".to_string()),
            zip: None,
        }),
        nicknames: Some(vec!["annie".to_string(), "al".to_string()]),
        lucky_numbers: Some(vec![7, 13]),
        pets: Some(vec![
            Pet {
                name: Some("Rex".to_string()),
                species: Some("dog".to_string()),
                age: Some(3),
            },
            Pet {
                name: Some("Tom".to_string()),
                species: None,
                age: None,
            },
        ]),
    }
}

/// Collection produced by serializing [`sample_person`]
pub fn sample_person_pairs() -> KeyValueCollection {
    pairs(&[
        ("Name", "Ann Lee"),
        ("Age", "41"),
        ("Birthday.Year", "1983"),
        ("Birthday.Month", "4"),
        ("Birthday.Day", "9"),
        ("Address.Street", "1 Main St"),
        ("Address.City", "Oslo"),
        ("HasAddress", "true"),
        ("Nicknames", "annie,al"),
        ("LuckyNumbers[0]", "7"),
        ("LuckyNumbers[1]", "13"),
        ("Pets[0].Name", "Rex"),
        ("Pets[0].Species", "dog"),
        ("Pets[0].Age", "3"),
        ("Pets[1].Name", "Tom"),
    ])
}

pub fn pairs(entries: &[(&str, &str)]) -> KeyValueCollection {
    entries.iter().copied().collect()
}
