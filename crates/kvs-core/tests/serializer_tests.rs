use kvs_core::prelude::*;
use kvs_core::{CompositeValues, DiagnosticKind, MappingError, SerializeError};
use kvs_test_utils::{
    date, pairs, person_helper, person_serializer, sample_person, sample_person_pairs, Address,
    Person, Pet,
};
use pretty_assertions::assert_eq;

fn entries(kv: &KeyValueCollection) -> Vec<(String, String)> {
    kv.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_serialize_sample_person() {
    let output = person_serializer().serialize(&sample_person()).unwrap();
    assert_eq!(entries(&output), entries(&sample_person_pairs()));
}

#[test]
fn test_deserialize_sample_person() {
    let person = person_serializer()
        .deserialize(&sample_person_pairs())
        .unwrap()
        .unwrap();
    assert_eq!(person, sample_person());
}

#[test]
fn test_query_round_trip() {
    let serializer = person_serializer();
    let query = serializer.serialize_query(&sample_person()).unwrap();
    assert!(query.starts_with("Name=Ann+Lee&Age=41"));
    let back = serializer.deserialize_query(&query).unwrap().unwrap();
    assert_eq!(back, sample_person());
}

#[test]
fn test_empty_input_is_absent() {
    #[derive(Debug, Default)]
    struct Paging {
        page: Option<u32>,
        size: Option<u32>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Paging>::with_default()
            .simple("page", |p: &Paging| p.page.as_ref(), |p, v| p.page = Some(v), |m| m)
            .simple("size", |p: &Paging| p.size.as_ref(), |p, v| p.size = Some(v), |m| m)
            .build()
            .unwrap(),
    );

    let report = serializer
        .deserialize_with_report(&KeyValueCollection::new())
        .unwrap();
    assert!(report.value.is_none());
    assert!(report.is_clean());

    let paging = serializer.deserialize_query("size=20").unwrap().unwrap();
    assert_eq!(paging.page, None);
    assert_eq!(paging.size, Some(20));
}

#[test]
fn test_empty_input_fails_mandatory_root_member() {
    let err = person_serializer()
        .deserialize(&KeyValueCollection::new())
        .unwrap_err();
    assert_eq!(err.as_mapping(), Some(&MappingError::missing("Name")));
}

#[test]
fn test_missing_mandatory_root_member_is_error() {
    let err = person_serializer()
        .deserialize(&pairs(&[("Age", "30")]))
        .unwrap_err();
    assert_eq!(err.as_mapping(), Some(&MappingError::missing("Name")));
}

#[test]
fn test_invalid_optional_value_is_dropped() {
    let report = person_serializer()
        .deserialize_with_report(&pairs(&[("Name", "Bo"), ("Age", "old")]))
        .unwrap();
    let person = report.value.unwrap();
    assert_eq!(person.name.as_deref(), Some("Bo"));
    assert_eq!(person.age, None);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].key, "Age");
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::InvalidValue { .. }
    ));
}

#[test]
fn test_empty_values_count_as_missing() {
    let err = person_serializer()
        .deserialize(&pairs(&[("Name", ""), ("Age", "3")]))
        .unwrap_err();
    assert_eq!(err.as_mapping(), Some(&MappingError::missing("Name")));
}

#[test]
fn test_flag_gate_closed_ignores_nested_class() {
    let person = person_serializer()
        .deserialize(&pairs(&[("Name", "Bo"), ("Address.Street", "2 Side Rd")]))
        .unwrap()
        .unwrap();
    assert_eq!(person.address, None);
}

#[test]
fn test_flag_gate_open_reads_nested_class() {
    let person = person_serializer()
        .deserialize(&pairs(&[
            ("Name", "Bo"),
            ("HasAddress", "yes"),
            ("Address.Street", "2 Side Rd"),
        ]))
        .unwrap()
        .unwrap();
    assert_eq!(
        person.address,
        Some(Address {
            street: Some("2 Side Rd".to_string()),
            ..Address::default()
        })
    );
}

#[test]
fn test_nested_branch_abort_is_absorbed() {
    let report = person_serializer()
        .deserialize_with_report(&pairs(&[
            ("Name", "Bo"),
            ("HasAddress", "true"),
            ("Address.City", "Oslo"),
        ]))
        .unwrap();
    let person = report.value.unwrap();
    assert_eq!(person.address, None);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].key, "Address");
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::BranchAborted { cause } if cause.contains("Address.Street")
    ));
}

#[test]
fn test_flag_value_must_match() {
    #[derive(Debug, Default)]
    struct Contact {
        email: Option<String>,
        phone: Option<String>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Contact>::with_default()
            .simple("Email", |c: &Contact| c.email.as_ref(), |c, v| c.email = Some(v), |m| {
                m.flag_value("Via", "email")
            })
            .simple("Phone", |c: &Contact| c.phone.as_ref(), |c, v| c.phone = Some(v), |m| {
                m.flag_value("Via", "phone")
            })
            .build()
            .unwrap(),
    );

    let contact = serializer
        .deserialize(&pairs(&[("Via", "phone"), ("Email", "a@b.c"), ("Phone", "555")]))
        .unwrap()
        .unwrap();
    assert_eq!(contact.email, None);
    assert_eq!(contact.phone.as_deref(), Some("555"));

    let output = serializer
        .serialize(&Contact {
            email: Some("a@b.c".to_string()),
            phone: None,
        })
        .unwrap();
    assert_eq!(output.get("Email"), Some("a@b.c"));
    assert_eq!(output.get("Via"), Some("email"));
    assert_eq!(output.len(), 2);
}

#[test]
fn test_flagged_class_without_values_round_trips() {
    #[derive(Debug, Default, PartialEq)]
    struct Options {
        color: Option<String>,
    }

    #[derive(Debug, Default)]
    struct Order {
        id: Option<u32>,
        gift: Option<Options>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Order>::with_default()
            .simple("Id", |o: &Order| o.id.as_ref(), |o, v| o.id = Some(v), |m| m)
            .class("Gift", |o: &Order| o.gift.as_ref(), |o, v| o.gift = Some(v), |m| {
                m.flag("IsGift").simple(
                    "Color",
                    |g: &Options| g.color.as_ref(),
                    |g, v| g.color = Some(v),
                    |c| c,
                )
            })
            .build()
            .unwrap(),
    );

    let order = Order {
        id: Some(7),
        gift: Some(Options::default()),
    };
    let output = serializer.serialize(&order).unwrap();
    assert_eq!(
        entries(&output),
        vec![
            ("Id".to_string(), "7".to_string()),
            ("IsGift".to_string(), "true".to_string()),
        ]
    );

    let back = serializer.deserialize(&output).unwrap().unwrap();
    assert_eq!(back.gift, Some(Options::default()));

    let plain = serializer.deserialize_query("Id=7").unwrap().unwrap();
    assert_eq!(plain.gift, None);
}

#[test]
fn test_mandatory_nested_class_aborts_enclosing_optional_class() {
    #[derive(Debug, Default, PartialEq)]
    struct Leaf {
        w: Option<String>,
        v: Option<String>,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        tag: Option<String>,
        leaf: Option<Leaf>,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        name: Option<String>,
        inner: Option<Inner>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Outer>::with_default()
            .simple("Name", |o: &Outer| o.name.as_ref(), |o, v| o.name = Some(v), |m| m)
            .class("Inner", |o: &Outer| o.inner.as_ref(), |o, v| o.inner = Some(v), |m| {
                m.simple("Tag", |i: &Inner| i.tag.as_ref(), |i, v| i.tag = Some(v), |t| t)
                    .class("Leaf", |i: &Inner| i.leaf.as_ref(), |i, v| i.leaf = Some(v), |l| {
                        l.mandatory()
                            .simple("W", |f: &Leaf| f.w.as_ref(), |f, v| f.w = Some(v), |w| w)
                            .simple("V", |f: &Leaf| f.v.as_ref(), |f, v| f.v = Some(v), |v| {
                                v.mandatory()
                            })
                    })
            })
            .build()
            .unwrap(),
    );

    let report = serializer
        .deserialize_with_report(&pairs(&[
            ("Name", "a"),
            ("Inner.Tag", "t"),
            ("Inner.Leaf.W", "w"),
        ]))
        .unwrap();
    let outer = report.value.unwrap();
    assert_eq!(outer.name.as_deref(), Some("a"));
    assert_eq!(outer.inner, None);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].key, "Inner");
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::BranchAborted { cause } if cause.contains("Inner.Leaf.V")
    ));

    let source = Outer {
        name: Some("a".to_string()),
        inner: Some(Inner {
            tag: Some("t".to_string()),
            leaf: Some(Leaf {
                w: Some("w".to_string()),
                v: None,
            }),
        }),
    };
    let report = serializer.serialize_with_report(&source).unwrap();
    assert_eq!(
        entries(&report.value),
        vec![("Name".to_string(), "a".to_string())]
    );
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].key, "Inner");
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::BranchAborted { .. }
    ));
}

#[test]
fn test_serialize_rolls_back_aborted_branch() {
    let person = Person {
        name: Some("Bo".to_string()),
        address: Some(Address {
            street: None,
            city: Some("Oslo".to_string()),
            zip: Some("0150".to_string()),
        }),
        ..Person::default()
    };
    let report = person_serializer().serialize_with_report(&person).unwrap();
    assert_eq!(entries(&report.value), vec![("Name".to_string(), "Bo".to_string())]);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].key, "Address");
}

#[test]
fn test_serialize_missing_mandatory_root_member_is_error() {
    let err = person_serializer().serialize(&Person::default()).unwrap_err();
    assert!(matches!(
        err,
        SerializeError::Mapping(MappingError::MissingMandatory { ref key }) if key == "Name"
    ));
}

#[test]
fn test_composite_partial_components_are_invalid() {
    let report = person_serializer()
        .deserialize_with_report(&pairs(&[("Name", "Bo"), ("Birthday.Year", "1990")]))
        .unwrap();
    assert_eq!(report.value.unwrap().birthday, None);
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::InvalidValue { reason } if reason == "missing component Month"
    ));
}

#[test]
fn test_composite_check_rejects_value_before_writing() {
    #[derive(Debug, Default)]
    struct Range {
        span: Option<(i32, i32)>,
        label: Option<String>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Range>::with_default()
            .composite("Span", |r: &Range| r.span.as_ref(), |r, v| r.span = Some(v), |m| {
                m.component("From", |(from, _): &(i32, i32)| Some(from.to_string()))
                    .component("To", |(_, to): &(i32, i32)| Some(to.to_string()))
                    .check_with(|(from, to): &(i32, i32)| {
                        if from <= to {
                            Ok(())
                        } else {
                            Err(format!("{from} is after {to}"))
                        }
                    })
                    .deserialize_with(|values: &CompositeValues| {
                        Ok((values.parse("From")?, values.parse("To")?))
                    })
            })
            .simple("Label", |r: &Range| r.label.as_ref(), |r, v| r.label = Some(v), |m| m)
            .build()
            .unwrap(),
    );

    let ok = serializer
        .serialize(&Range {
            span: Some((1, 5)),
            label: None,
        })
        .unwrap();
    assert_eq!(ok.get("Span.From"), Some("1"));
    assert_eq!(ok.get("Span.To"), Some("5"));

    let report = serializer
        .serialize_with_report(&Range {
            span: Some((9, 2)),
            label: Some("x".to_string()),
        })
        .unwrap();
    assert_eq!(
        entries(&report.value),
        vec![("Label".to_string(), "x".to_string())]
    );
    assert_eq!(report.diagnostics[0].key, "Span");
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::InvalidValue { reason } if reason == "9 is after 2"
    ));
}

#[test]
fn test_composite_rejects_impossible_date() {
    let report = person_serializer()
        .deserialize_with_report(&pairs(&[
            ("Name", "Bo"),
            ("Birthday.Year", "2001"),
            ("Birthday.Month", "2"),
            ("Birthday.Day", "30"),
        ]))
        .unwrap();
    assert_eq!(report.value.unwrap().birthday, None);
    assert_eq!(report.diagnostics[0].key, "Birthday");

    let person = person_serializer()
        .deserialize(&pairs(&[
            ("Name", "Bo"),
            ("Birthday.Year", "2000"),
            ("Birthday.Month", "2"),
            ("Birthday.Day", "29"),
        ]))
        .unwrap()
        .unwrap();
    assert_eq!(person.birthday, Some(date(2000, 2, 29)));
}

#[test]
fn test_aggregate_collection_skips_empty_and_invalid_items() {
    #[derive(Debug, Default)]
    struct Filter {
        ids: Option<Vec<u32>>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Filter>::with_default()
            .value_collection("Ids", |f: &Filter| f.ids.as_ref(), |f, v| f.ids = Some(v), |m| m)
            .build()
            .unwrap(),
    );

    let report = serializer
        .deserialize_with_report(&pairs(&[("Ids", "1,,x,3,")]))
        .unwrap();
    assert_eq!(report.value.unwrap().ids, Some(vec![1, 3]));
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::ItemSkipped { index: 1, .. }
    ));
}

#[test]
fn test_repeated_query_keys_feed_aggregate_collection() {
    let person = person_serializer()
        .deserialize_query("Name=Bo&Nicknames=b&Nicknames=bobby")
        .unwrap()
        .unwrap();
    assert_eq!(
        person.nicknames,
        Some(vec!["b".to_string(), "bobby".to_string()])
    );
}

#[test]
fn test_aggregate_separator_override() {
    #[derive(Debug, Default)]
    struct Tags {
        tags: Option<Vec<String>>,
    }

    let serializer = KeyValueSerializer::new(
        ClassMappingHelper::<Tags>::with_default()
            .value_collection("Tags", |t: &Tags| t.tags.as_ref(), |t, v| t.tags = Some(v), |m| {
                m.aggregate_with("|")
            })
            .build()
            .unwrap(),
    );

    let tags = Tags {
        tags: Some(vec!["a,b".to_string(), "c".to_string()]),
    };
    let output = serializer.serialize(&tags).unwrap();
    assert_eq!(output.get("Tags"), Some("a,b|c"));
    let back = serializer.deserialize(&output).unwrap().unwrap();
    assert_eq!(back.tags, tags.tags);
}

#[test]
fn test_aggregate_item_containing_separator_is_dropped() {
    let person = Person {
        name: Some("Bo".to_string()),
        nicknames: Some(vec!["a,b".to_string()]),
        ..Person::default()
    };
    let report = person_serializer().serialize_with_report(&person).unwrap();
    assert!(report.value.get("Nicknames").is_none());
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::InvalidValue { reason } if reason.contains("separator")
    ));
}

#[test]
fn test_separate_collection_compacts_gaps() {
    let person = person_serializer()
        .deserialize(&pairs(&[
            ("Name", "Bo"),
            ("LuckyNumbers[5]", "50"),
            ("LuckyNumbers[2]", "20"),
            ("LuckyNumbers[9]", ""),
        ]))
        .unwrap()
        .unwrap();
    assert_eq!(person.lucky_numbers, Some(vec![20, 50]));

    let output = person_serializer().serialize(&person).unwrap();
    assert_eq!(output.get("LuckyNumbers[0]"), Some("20"));
    assert_eq!(output.get("LuckyNumbers[1]"), Some("50"));
}

#[test]
fn test_class_collection_skips_aborted_items() {
    let report = person_serializer()
        .deserialize_with_report(&pairs(&[
            ("Name", "Bo"),
            ("Pets[0].Name", "Rex"),
            ("Pets[1].Species", "cat"),
            ("Pets[4].Name", "Tom"),
            ("Pets[4].Age", "2"),
        ]))
        .unwrap();
    let pets = report.value.unwrap().pets.unwrap();
    assert_eq!(
        pets.iter().map(|p| p.name.as_deref()).collect::<Vec<_>>(),
        vec![Some("Rex"), Some("Tom")]
    );
    assert_eq!(pets[1].age, Some(2));
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::ItemSkipped { index: 1, .. }
    ));
}

#[test]
fn test_class_collection_writes_consecutive_indices() {
    let person = Person {
        name: Some("Bo".to_string()),
        pets: Some(vec![
            Pet {
                species: Some("nameless".to_string()),
                ..Pet::default()
            },
            Pet {
                name: Some("Rex".to_string()),
                ..Pet::default()
            },
        ]),
        ..Person::default()
    };
    let report = person_serializer().serialize_with_report(&person).unwrap();
    assert_eq!(
        entries(&report.value),
        vec![
            ("Name".to_string(), "Bo".to_string()),
            ("Pets[0].Name".to_string(), "Rex".to_string()),
        ]
    );
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::ItemSkipped { index: 0, .. }
    ));
}

#[test]
fn test_collection_limit_is_fatal() {
    let serializer = person_serializer()
        .with_config(SerializerConfig::default().with_max_collection_items(2))
        .unwrap();

    let err = serializer
        .deserialize(&pairs(&[("Name", "Bo"), ("Nicknames", "a,b,c")]))
        .unwrap_err();
    assert_eq!(
        err.as_mapping(),
        Some(&MappingError::LimitExceeded {
            key: "Nicknames".to_string(),
            count: 3,
            limit: 2
        })
    );

    let err = serializer
        .deserialize(&pairs(&[
            ("Name", "Bo"),
            ("HasAddress", "true"),
            ("Address.Street", "x"),
            ("Pets[0].Name", "a"),
            ("Pets[1].Name", "b"),
            ("Pets[2].Name", "c"),
        ]))
        .unwrap_err();
    assert!(matches!(
        err.as_mapping(),
        Some(MappingError::LimitExceeded { key, .. }) if key == "Pets"
    ));
}

#[test]
fn test_custom_config_changes_keys() {
    let config = SerializerConfig::from_yaml_str(
        "naming:\n  separator: \"_\"\n  index_open: \"(\"\n  index_close: \")\"\naggregate_separator: \";\"\ndefault_flag_value: \"1\"\n",
    )
    .unwrap();
    let serializer = person_serializer().with_config(config).unwrap();

    let output = serializer.serialize(&sample_person()).unwrap();
    assert_eq!(output.get("Address_Street"), Some("1 Main St"));
    assert_eq!(output.get("HasAddress"), Some("1"));
    assert_eq!(output.get("Nicknames"), Some("annie;al"));
    assert_eq!(output.get("Pets(1)_Name"), Some("Tom"));
    assert_eq!(output.get("Birthday_Year"), None);
    assert_eq!(output.get("Birthday.Year"), Some("1983"));

    let back = serializer.deserialize(&output).unwrap().unwrap();
    assert_eq!(back, sample_person());
}

#[test]
fn test_prefix_policy_and_member_override() {
    let override_policy = DefaultKeyNamingPolicy::new().with_separator("-").shared();
    let mapping = person_helper()
        .class(
            "Billing",
            |p: &Person| p.address.as_ref(),
            |p, v| p.address = Some(v),
            |m| kvs_test_utils::address_members(m.naming_policy(override_policy)),
        )
        .build()
        .unwrap();
    let serializer = KeyValueSerializer::new(mapping)
        .with_naming_policy(DefaultKeyNamingPolicy::new().with_prefix("p").shared());

    let person = Person {
        name: Some("Bo".to_string()),
        address: Some(Address {
            street: Some("x".to_string()),
            ..Address::default()
        }),
        ..Person::default()
    };
    let output = serializer.serialize(&person).unwrap();
    assert_eq!(output.get("p.Name"), Some("Bo"));
    assert_eq!(output.get("p.Address.Street"), Some("x"));
    assert_eq!(output.get("p.HasAddress"), Some("true"));
    assert_eq!(output.get("Billing-Street"), Some("x"));
}

#[test]
fn test_describe_lists_keys() {
    let keys: Vec<String> = person_serializer()
        .describe()
        .into_iter()
        .map(|d| d.key)
        .collect();
    assert_eq!(
        keys,
        vec![
            "Name",
            "Age",
            "Birthday.Year",
            "Birthday.Month",
            "Birthday.Day",
            "Address",
            "Address.Street",
            "Address.City",
            "Address.Zip",
            "Nicknames",
            "LuckyNumbers",
            "Pets",
            "Pets[0].Name",
            "Pets[0].Species",
            "Pets[0].Age",
        ]
    );

    let pet_name = person_serializer()
        .describe()
        .into_iter()
        .find(|d| d.key == "Pets[0].Name")
        .unwrap();
    assert!(pet_name.mandatory);
}

#[test]
fn test_with_config_rejects_invalid_settings() {
    let err = person_serializer()
        .with_config(SerializerConfig::default().with_aggregate_separator(""))
        .unwrap_err();
    assert!(matches!(err, SerializeError::Config(_)));
}
