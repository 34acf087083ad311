//! Shared fixtures for the cellmap-db integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use cellmap_db::{DescriptorBuilder, Entity, Versioned};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub visits: Vec<Versioned<u32>>,
}

impl Entity for Address {
    fn describe(d: &mut DescriptorBuilder<'_, Self>) {
        d.field("street", |a| &a.street, |a| &mut a.street)
            .field("city", |a| &a.city, |a| &mut a.city)
            .field("visitLog", |a| &a.visits, |a| &mut a.visits);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub status: Option<Versioned<String>>,
    pub emails: Vec<Versioned<String>>,
    pub scores: BTreeMap<String, Versioned<i64>>,
    pub home: Option<Address>,
}

impl Entity for User {
    fn describe(d: &mut DescriptorBuilder<'_, Self>) {
        d.row_key("id", |u| &u.id, |u| &mut u.id)
            .field("name", |u| &u.name, |u| &mut u.name)
            .field("age", |u| &u.age, |u| &mut u.age)
            .field("accountStatus", |u| &u.status, |u| &mut u.status)
            .field("emailAddresses", |u| &u.emails, |u| &mut u.emails)
            .field("scores", |u| &u.scores, |u| &mut u.scores)
            .nested("homeAddress", |u| &u.home, |u| &mut u.home);
    }
}

/// The record from the reference scenario: a name and two scores.
pub fn ann() -> User {
    let mut scores = BTreeMap::new();
    scores.insert("math".to_string(), Versioned::new(90, 100));
    scores.insert("art".to_string(), Versioned::new(88, 200));
    User {
        id: "u1".to_string(),
        name: Some("Ann".to_string()),
        scores,
        ..Default::default()
    }
}

/// A record with every attribute set.
pub fn full_user(id: &str) -> User {
    let mut user = ann();
    user.id = id.to_string();
    user.age = Some(41);
    user.status = Some(Versioned::new("active".to_string(), 300));
    user.emails = vec![
        Versioned::new("ann@work.example".to_string(), 500),
        Versioned::new("ann@home.example".to_string(), 400),
    ];
    user.home = Some(Address {
        street: Some("1 Main St".to_string()),
        city: Some("Springfield".to_string()),
        visits: vec![Versioned::new(3, 700), Versioned::new(2, 600)],
    });
    user
}
