#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use automap_core::{Shape, ShapeBuilder};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Badge {
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

impl Shape for Address {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("city", |a| &a.city, |a| &mut a.city)
            .nullable("zip", |a| &a.zip, |a| &mut a.zip);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressDto {
    pub city: String,
    pub zip: Option<String>,
    pub country: String,
}

impl Shape for AddressDto {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("city", |a| &a.city, |a| &mut a.city)
            .nullable("zip", |a| &a.zip, |a| &mut a.zip)
            .value("country", |a| &a.country, |a| &mut a.country);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub nickname: Option<String>,
    pub tags: Vec<String>,
    pub scores: Vec<u32>,
    pub badges: Vec<Arc<Badge>>,
    pub address: Option<Address>,
    pub id: u64,
    pub secret: String,
}

impl Shape for Person {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("name", |p| &p.name, |p| &mut p.name)
            .value("age", |p| &p.age, |p| &mut p.age)
            .nullable("nickname", |p| &p.nickname, |p| &mut p.nickname)
            .sequence("tags", |p| &p.tags, |p| &mut p.tags)
            .sequence("scores", |p| &p.scores, |p| &mut p.scores)
            .sequence("badges", |p| &p.badges, |p| &mut p.badges)
            .optional_record("address", |p| &p.address, |p| &mut p.address)
            .value("id", |p| &p.id, |p| &mut p.id)
            .value("secret", |p| &p.secret, |p| &mut p.secret)
            .computed("display_name", |p| format!("{} ({})", p.name, p.age))
            .write_only("secret");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonDto {
    pub name: String,
    pub age: u32,
    pub nickname: Option<String>,
    pub tags: Vec<String>,
    pub scores: VecDeque<u32>,
    pub badges: Vec<Arc<Badge>>,
    pub address: Option<AddressDto>,
    pub id: u64,
    pub secret: String,
    pub display_name: String,
    pub extra: String,
}

impl Shape for PersonDto {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("name", |p| &p.name, |p| &mut p.name)
            .value("age", |p| &p.age, |p| &mut p.age)
            .nullable("nickname", |p| &p.nickname, |p| &mut p.nickname)
            .sequence("tags", |p| &p.tags, |p| &mut p.tags)
            .sequence("scores", |p| &p.scores, |p| &mut p.scores)
            .sequence("badges", |p| &p.badges, |p| &mut p.badges)
            .optional_record("address", |p| &p.address, |p| &mut p.address)
            .value("id", |p| &p.id, |p| &mut p.id)
            .value("secret", |p| &p.secret, |p| &mut p.secret)
            .value("display_name", |p| &p.display_name, |p| &mut p.display_name)
            .value("extra", |p| &p.extra, |p| &mut p.extra)
            .read_only("id");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub name: String,
    pub tags: Vec<String>,
    pub address: Option<Address>,
}

impl Shape for Customer {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("name", |c| &c.name, |c| &mut c.name)
            .sequence("tags", |c| &c.tags, |c| &mut c.tags)
            .optional_record("address", |c| &c.address, |c| &mut c.address);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerDto {
    pub name: String,
    pub tags: Vec<String>,
    pub address: Option<AddressDto>,
}

impl Shape for CustomerDto {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("name", |c| &c.name, |c| &mut c.name)
            .sequence("tags", |c| &c.tags, |c| &mut c.tags)
            .optional_record("address", |c| &c.address, |c| &mut c.address);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counter {
    pub count: u32,
}

impl Shape for Counter {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape.value("count", |c| &c.count, |c| &mut c.count);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideCounter {
    pub count: u64,
}

impl Shape for WideCounter {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape.value("count", |c| &c.count, |c| &mut c.count);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outer {
    pub label: String,
    pub inner: Counter,
}

impl Shape for Outer {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("label", |o| &o.label, |o| &mut o.label)
            .record("inner", |o| &o.inner, |o| &mut o.inner);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideOuter {
    pub label: String,
    pub inner: WideCounter,
}

impl Shape for WideOuter {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("label", |o| &o.label, |o| &mut o.label)
            .record("inner", |o| &o.inner, |o| &mut o.inner);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub value: u32,
    pub next: Option<Box<Node>>,
}

impl Shape for Node {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("value", |n| &n.value, |n| &mut n.value)
            .boxed_record("next", |n| &n.next, |n| &mut n.next);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDto {
    pub value: u32,
    pub next: Option<Box<NodeDto>>,
}

impl Shape for NodeDto {
    fn describe(shape: &mut ShapeBuilder<Self>) {
        shape
            .value("value", |n| &n.value, |n| &mut n.value)
            .boxed_record("next", |n| &n.next, |n| &mut n.next);
    }
}

/// A list of `len` nodes counting up from zero.
pub fn chain(len: u32) -> Node {
    (0..len).rev().fold(Node::default(), |next, value| Node {
        value,
        next: (value + 1 < len).then(|| Box::new(next)),
    })
}

pub fn sample_person() -> Person {
    Person {
        name: "Ann".to_string(),
        age: 41,
        nickname: Some("annie".to_string()),
        tags: vec!["a".to_string(), "b".to_string()],
        scores: vec![3, 1, 2],
        badges: vec![Arc::new(Badge {
            label: "gold".to_string(),
        })],
        address: Some(Address {
            city: "Oslo".to_string(),
            zip: Some("0150".to_string()),
        }),
        id: 7,
        secret: "hunter2".to_string(),
    }
}

/// Depth of a node chain, counting the head.
pub fn node_depth(node: &NodeDto) -> usize {
    1 + node.next.as_deref().map_or(0, node_depth)
}
