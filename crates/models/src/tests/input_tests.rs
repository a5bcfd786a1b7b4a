use crate::{
    appointment, customer, errors::ModelError, project, request, service_item, ManagedEntity,
};

#[test]
fn new_customer_rejects_bad_email() {
    let input = customer::NewCustomer {
        name: "Acme".into(),
        email: "not-an-email".into(),
        phone: None,
        company: None,
        owner_id: None,
    };
    assert!(matches!(input.into_active_model(), Err(ModelError::Validation(_))));
}

#[test]
fn appointment_duration_is_bounded() {
    assert!(appointment::validate_duration(0).is_err());
    assert!(appointment::validate_duration(appointment::MAX_DURATION_MINUTES + 1).is_err());
    assert_eq!(appointment::validate_duration(30).unwrap(), 30);
}

#[test]
fn changes_skip_absent_fields() {
    let changes = service_item::ServiceItemChanges { price_cents: Some(1500), ..Default::default() }
        .into_changes()
        .unwrap();
    assert_eq!(changes.len(), 1);
    assert!(matches!(changes[0].0, service_item::Column::PriceCents));

    let err = service_item::ServiceItemChanges { price_cents: Some(-1), ..Default::default() }.into_changes();
    assert!(err.is_err());

    let cleared = customer::CustomerChanges { phone: Some(" ".into()), ..Default::default() }
        .into_changes()
        .unwrap();
    assert_eq!(cleared[0].1, sea_orm::Value::String(None));
}

#[test]
fn every_reachable_status_is_whitelisted() {
    fn check<E: ManagedEntity>() {
        assert!(E::STATUSES.contains(&E::ARCHIVED_STATUS));
        for from in E::STATUSES {
            for to in E::next_statuses(from) {
                assert!(E::is_known_status(to), "{}: {from} -> {to}", E::KIND);
                assert_ne!(from, to);
            }
        }
    }
    check::<customer::Entity>();
    check::<project::Entity>();
    check::<appointment::Entity>();
    check::<service_item::Entity>();
    check::<request::Entity>();
}

#[test]
fn appointment_terminal_states() {
    assert!(appointment::Entity::is_terminal("completed"));
    assert!(appointment::Entity::is_terminal("cancelled"));
    assert!(appointment::Entity::is_terminal("no_show"));
    assert!(!appointment::Entity::is_terminal("planned"));
    assert!(appointment::Entity::next_statuses("planned").contains(&"completed"));
    assert_eq!(project::Entity::initial_status(), "planned");
}

#[test]
fn request_priority_and_conversion_defaults() {
    assert_eq!(request::validate_priority(" High ").unwrap(), "high");
    assert!(request::validate_priority("whenever").is_err());

    let blank = request::NewRequest {
        customer_id: 1,
        subject: "Leak".into(),
        description: "  ".into(),
        priority: None,
        category: None,
    };
    assert!(matches!(blank.into_active_model(), Err(ModelError::Validation(_))));

    let conversion: request::Conversion =
        serde_json::from_str(r#"{"scheduled_at": "2024-06-03T10:00:00Z", "notes": " "}"#).unwrap();
    assert_eq!(conversion.duration_minutes, 60);
    assert_eq!(conversion.note(), request::CONVERSION_NOTE);
    assert!(request::Entity::is_terminal("completed"));
    assert!(!request::Entity::is_terminal("assigned"));
}
