//! Schemas for the zoo demo.
//!
//! The root [`Zoo`] has a keeper, a "star" animal whose species is chosen on
//! the command line, a list of residents, and a dict of feeding budgets.
//! Species extend the abstract `Animal` schema, so any of them fits wherever
//! an `Animal` is declared.

use std::collections::BTreeMap;

use polyflag::{ConfigError, EnumRepr, EnumSpec, Field, Mode, Registry, Schema, TypeExpr};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub fn registry() -> Result<Registry, ConfigError> {
    let shift = EnumSpec::new("Shift", EnumRepr::Str)
        .member("Day", "day")
        .member("Night", "night");

    Registry::new()
        .with(
            Schema::new("Animal")
                .abstract_type()
                .field(Field::new("name", TypeExpr::str()).default_value("unnamed"))
                .field(Field::new("age", TypeExpr::int()).default_value(1)),
        )?
        .with(
            Schema::new("Lion")
                .extends("Animal")
                .field(
                    Field::new("roar_db", TypeExpr::float())
                        .default_value(110.0)
                        .help("Loudness of the roar"),
                ),
        )?
        .with(
            Schema::new("Penguin")
                .extends("Animal")
                .alt_name("Pingu")
                .field(Field::new("colony", TypeExpr::int()).default_value(12)),
        )?
        .with(
            Schema::new("Keeper")
                .field(Field::new("name", TypeExpr::str()).default_value("Sam"))
                .field(Field::new("shift", TypeExpr::enumeration(shift)).default_value("Day")),
        )?
        .with(
            Schema::new("Zoo")
                .field(Field::new("title", TypeExpr::str()).default_value("City Zoo"))
                .field(
                    Field::new("keeper", TypeExpr::record("Keeper"))
                        .default_value(json!({}))
                        .mode(Mode::SSnake),
                )
                .field(
                    Field::new("star", TypeExpr::record("Animal"))
                        .default_value(json!({ "__cls__": "Lion", "name": "Leo" }))
                        .help("The animal on the poster"),
                )
                .field(
                    Field::new("residents", TypeExpr::list(TypeExpr::record("Animal")))
                        .default_with(|| json!([{ "__cls__": "Penguin" }, { "__cls__": "Penguin" }])),
                )
                .field(
                    Field::new("budgets", TypeExpr::dict(TypeExpr::str(), TypeExpr::float()))
                        .default_value(json!({})),
                ),
        )
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Lion {
    pub name: String,
    pub age: i64,
    pub roar_db: f64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Penguin {
    pub name: String,
    pub age: i64,
    pub colony: i64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "__cls__")]
pub enum Animal {
    Lion(Lion),
    Penguin(Penguin),
}

impl Animal {
    pub fn describe(&self) -> String {
        match self {
            Animal::Lion(l) => format!("{} the lion ({}y, roars at {} dB)", l.name, l.age, l.roar_db),
            Animal::Penguin(p) => {
                format!("{} the penguin ({}y, colony of {})", p.name, p.age, p.colony)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Keeper {
    pub name: String,
    pub shift: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Zoo {
    pub title: String,
    pub keeper: Keeper,
    pub star: Animal,
    pub residents: Vec<Animal>,
    pub budgets: BTreeMap<String, f64>,
}
