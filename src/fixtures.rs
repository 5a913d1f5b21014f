#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use crate::schema::{Field, Registry, Schema};
    use crate::types::{EnumRepr, EnumSpec, Mode, TypeExpr};

    fn registry(schemas: Vec<Schema>) -> Registry {
        let mut registry = Registry::new();
        for schema in schemas {
            registry.register(schema).unwrap();
        }
        registry
    }

    /// `Parent { child: Base }` with two concrete children, plus small
    /// schemas for required, optional and unknown-flag scenarios.
    pub fn hierarchy() -> Registry {
        registry(vec![
            Schema::new("Base").abstract_type(),
            Schema::new("Child1")
                .extends("Base")
                .field(Field::new("p1", TypeExpr::int()).default_value(0)),
            Schema::new("Child2")
                .extends("Base")
                .field(Field::new("p2", TypeExpr::float()).default_value(1.0)),
            Schema::new("Other").field(Field::new("o", TypeExpr::int()).default_value(0)),
            Schema::new("Parent").field(
                Field::new("child", TypeExpr::record("Base"))
                    .default_value(json!({ "__cls__": "Child1", "p1": 0 }))
                    .help("The child"),
            ),
            Schema::new("Counter").field(Field::new("i", TypeExpr::int()).default_value(0)),
            Schema::new("Close").field(Field::new("xy", TypeExpr::int()).default_value(0)),
            Schema::new("NeedsX")
                .field(Field::new("x", TypeExpr::int()))
                .field(Field::new("y", TypeExpr::str())),
            Schema::new("Holder").field(Field::new("req", TypeExpr::record("NeedsX"))),
            Schema::new("AbstractHolder").field(Field::new("child", TypeExpr::record("Base"))),
            Schema::new("Incomplete")
                .field(Field::new("child", TypeExpr::record("Base")))
                .field(Field::new("x", TypeExpr::int())),
            Schema::new("WithRequiredMeta")
                .field(Field::new("p", TypeExpr::int()).default_value(0).required()),
            Schema::new("OptionalHolder")
                .field(
                    Field::new("maybe_i", TypeExpr::optional(TypeExpr::int()))
                        .default_value(json!(null)),
                )
                .field(
                    Field::new("maybe_child", TypeExpr::optional(TypeExpr::record("Base")))
                        .default_value(json!(null)),
                )
                .field(Field::new("i", TypeExpr::int()).default_value(0)),
        ])
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Child1 {
        pub p1: i64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Child2 {
        pub p2: f64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(tag = "__cls__")]
    pub enum BaseKind {
        Child1(Child1),
        Child2(Child2),
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Parent {
        pub child: BaseKind,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Counter {
        pub i: i64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct OptionalHolder {
        pub maybe_i: Option<i64>,
        pub maybe_child: Option<BaseKind>,
        pub i: i64,
    }

    /// Three levels of nesting with subtypes at each level.
    pub fn levels() -> Registry {
        registry(vec![
            Schema::new("Level3base").field(Field::new("p1", TypeExpr::int()).default_value(0)),
            Schema::new("Level3a")
                .extends("Level3base")
                .field(Field::new("p1a", TypeExpr::str()).default_value("")),
            Schema::new("Level3aa")
                .extends("Level3a")
                .alt_name("AlternativeLevel3")
                .field(Field::new("p1aa", TypeExpr::float()).default_value(0.0)),
            Schema::new("Level2")
                .field(Field::new("p1", TypeExpr::int()).default_value(-1))
                .field(
                    Field::new("lvl3", TypeExpr::record("Level3base"))
                        .default_with(|| json!({ "__cls__": "Level3base" }))
                        .type_choices(["Level3base", "Level3a", "Level3aa"]),
                ),
            Schema::new("Level2a")
                .extends("Level2")
                .field(Field::new("p1a", TypeExpr::int()).default_value(0)),
            Schema::new("Level1b").field(Field::new("p", TypeExpr::int()).default_value(0)),
            Schema::new("Level1")
                .field(Field::new("p1", TypeExpr::int()).default_value(-1))
                .field(
                    Field::new("l", TypeExpr::record("Level2"))
                        .default_value(json!({ "__cls__": "Level2" })),
                )
                .field(
                    Field::new("strict", TypeExpr::record("Level3base"))
                        .default_value(json!({ "__cls__": "Level3a" }))
                        .type_choices(["Level3a", "Level3aa"])
                        .enforce_choices(true),
                ),
        ])
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Level3base {
        pub p1: i64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Level3a {
        pub p1: i64,
        pub p1a: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Level3aa {
        pub p1: i64,
        pub p1a: String,
        pub p1aa: f64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(tag = "__cls__")]
    pub enum Level3 {
        Level3base(Level3base),
        Level3a(Level3a),
        Level3aa(Level3aa),
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Level2 {
        pub p1: i64,
        pub lvl3: Level3,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Level2a {
        pub p1: i64,
        pub lvl3: Level3,
        pub p1a: i64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(tag = "__cls__")]
    pub enum Level2Kind {
        Level2(Level2),
        Level2a(Level2a),
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Level1 {
        pub p1: i64,
        pub l: Level2Kind,
        pub strict: Level3,
    }

    /// Dicts of records keyed by name, with module-qualified types.
    pub fn dicts() -> Registry {
        registry(vec![
            Schema::new("Sub1")
                .module("pkg")
                .field(Field::new("x", TypeExpr::int()).default_value(0)),
            Schema::new("Sub2")
                .module("pkg")
                .extends("Sub1")
                .field(Field::new("y", TypeExpr::str()).default_value("y")),
            Schema::new("DC")
                .field(
                    Field::new("subs", TypeExpr::dict(TypeExpr::str(), TypeExpr::record("Sub1")))
                        .default_value(json!({})),
                )
                .field(
                    Field::new("prims", TypeExpr::dict(TypeExpr::str(), TypeExpr::int()))
                        .default_value(json!({})),
                )
                .field(
                    Field::new(
                        "defaults",
                        TypeExpr::dict(TypeExpr::str(), TypeExpr::record("Sub1")),
                    )
                    .default_with(|| {
                        json!({
                            "first": { "__cls__": "Sub1", "x": 1 },
                            "second": { "__cls__": "Sub2" }
                        })
                    }),
                ),
        ])
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Sub1 {
        pub x: i64,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Sub2 {
        pub x: i64,
        pub y: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(tag = "__cls__")]
    pub enum SubKind {
        Sub1(Sub1),
        Sub2(Sub2),
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DC {
        pub subs: BTreeMap<String, SubKind>,
        pub prims: BTreeMap<String, i64>,
        pub defaults: BTreeMap<String, SubKind>,
    }

    /// A record with a nested record, a dict and a list of the same child,
    /// and a record whose field names prefix each other, for root ignore
    /// rules.
    pub fn ignorable() -> Registry {
        registry(vec![
            Schema::new("IChild").field(Field::new("s", TypeExpr::str()).default_value("")),
            Schema::new("Rates")
                .field(Field::new("lr", TypeExpr::float()).default_value(0.1))
                .field(Field::new("lr_decay", TypeExpr::float()).default_value(0.0)),
            Schema::new("IBase")
                .field(Field::new("i", TypeExpr::int()).default_value(0))
                .field(Field::new("c", TypeExpr::record("IChild")).default_value(json!({})))
                .field(
                    Field::new("d", TypeExpr::dict(TypeExpr::str(), TypeExpr::record("IChild")))
                        .default_value(json!({ "first": {}, "second": {} })),
                )
                .field(
                    Field::new("l", TypeExpr::list(TypeExpr::record("IChild")))
                        .default_value(json!([{}, {}])),
                ),
        ])
    }

    /// Containers, enums, modes, separators and generics in one record.
    pub fn collections() -> Registry {
        let color = EnumSpec::new("Color", EnumRepr::Str)
            .member("Red", "red")
            .member("Green", "green");
        let level = EnumSpec::new("Level", EnumRepr::Int)
            .member("Low", 0)
            .member("High", 1);
        registry(vec![
            Schema::new("Item").field(Field::new("v", TypeExpr::int()).default_value(0)),
            Schema::new("BigItem")
                .extends("Item")
                .field(Field::new("w", TypeExpr::int()).default_value(1)),
            Schema::new("Sep").field(
                Field::new("p", TypeExpr::int())
                    .default_value(0)
                    .separator('+'),
            ),
            Schema::new("Bag")
                .field(Field::new("ints", TypeExpr::list(TypeExpr::int())).default_value(json!([1, 2])))
                .field(Field::new("tags", TypeExpr::set(TypeExpr::str())).default_value(json!([])))
                .field(
                    Field::new("items", TypeExpr::list(TypeExpr::record("Item")))
                        .default_value(json!([{ "__cls__": "Item", "v": 1 }])),
                )
                .field(
                    Field::new("item_set", TypeExpr::set(TypeExpr::record("Item")))
                        .default_value(json!([])),
                )
                .field(Field::new("color", TypeExpr::enumeration(color)).default_value("Red"))
                .field(
                    Field::new("level", TypeExpr::optional(TypeExpr::enumeration(level)))
                        .default_value(json!(null)),
                )
                .field(
                    Field::new("maybe", TypeExpr::optional(TypeExpr::record("Item")))
                        .default_value(json!(null)),
                )
                .field(
                    Field::new("weights", TypeExpr::dict(TypeExpr::int(), TypeExpr::float()))
                        .default_value(json!({})),
                )
                .field(
                    Field::new("speed", TypeExpr::str())
                        .default_value("fast")
                        .value_choices(["fast", "slow"]),
                )
                .field(Field::new("flag", TypeExpr::bool()).default_value(false))
                .field(
                    Field::new("hidden", TypeExpr::int())
                        .default_value(7)
                        .mode(Mode::Ignore),
                )
                .field(
                    Field::new("ssc", TypeExpr::record("Item"))
                        .default_value(json!({}))
                        .mode(Mode::SSnake),
                )
                .field(
                    Field::new("flat_item", TypeExpr::record("Item"))
                        .default_value(json!({}))
                        .mode(Mode::Flat),
                )
                .field(
                    Field::new("sub", TypeExpr::record("Sep"))
                        .default_value(json!({}))
                        .separator('/'),
                )
                .field(
                    Field::new("gen", TypeExpr::param("T", Some(TypeExpr::record("Item"))))
                        .default_value(json!({})),
                )
                .field(
                    Field::new("fixed", TypeExpr::record("Item"))
                        .default_value(json!({ "__cls__": "BigItem" }))
                        .fix_type(),
                )
                .field(
                    Field::new("free", TypeExpr::record("Item"))
                        .default_value(json!({}))
                        .no_subclass_check(),
                ),
        ])
    }
}
