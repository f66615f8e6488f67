use kvs_core::KeyValueCollection;
use kvs_test_utils::{date, person_serializer, Address, Person, Pet};
use proptest::prelude::*;

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 &=%+.]{1,12}"
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

fn address() -> impl Strategy<Value = Address> {
    (text(), proptest::option::of(text()), proptest::option::of("[0-9]{4}")).prop_map(
        |(street, city, zip)| Address {
            street: Some(street),
            city,
            zip,
        },
    )
}

fn pet() -> impl Strategy<Value = Pet> {
    (text(), proptest::option::of(text()), proptest::option::of(0..30u32)).prop_map(
        |(name, species, age)| Pet {
            name: Some(name),
            species,
            age,
        },
    )
}

fn person() -> impl Strategy<Value = Person> {
    (
        text(),
        proptest::option::of(any::<u32>()),
        proptest::option::of((1..=9999i32, 1..=12u32, 1..=28u32)),
        proptest::option::of(address()),
        proptest::collection::vec("[a-z ]{1,8}", 0..4),
        proptest::collection::vec(any::<i64>(), 0..4),
        proptest::collection::vec(pet(), 0..4),
    )
        .prop_map(
            |(name, age, birthday, address, nicknames, lucky_numbers, pets)| Person {
                name: Some(name),
                age,
                birthday: birthday.map(|(y, m, d)| date(y, m, d)),
                address,
                nicknames: non_empty(nicknames),
                lucky_numbers: non_empty(lucky_numbers),
                pets: non_empty(pets),
            },
        )
}

proptest! {
    #[test]
    fn prop_collection_round_trip(person in person()) {
        let serializer = person_serializer();
        let report = serializer.serialize_with_report(&person).unwrap();
        prop_assert!(report.is_clean());

        let back = serializer.deserialize(&report.value).unwrap();
        prop_assert_eq!(back, Some(person));
    }

    #[test]
    fn prop_query_round_trip(person in person()) {
        let serializer = person_serializer();
        let query = serializer.serialize_query(&person).unwrap();
        let back = serializer.deserialize_query(&query).unwrap();
        prop_assert_eq!(back, Some(person));
    }

    #[test]
    fn prop_deserialize_never_panics(
        entries in proptest::collection::vec(("[A-Za-z\\[\\]0-9.]{1,16}", "[a-z0-9,]{0,6}"), 0..12)
    ) {
        let input: KeyValueCollection = entries.into_iter().collect();
        let _ = person_serializer().deserialize(&input);
    }
}
