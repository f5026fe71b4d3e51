//! Numeric code tables used by the roster for race, class, and faction.
//!
//! Name lookups are case- and accent-insensitive. Unknown names resolve
//! to `None`, and callers treat that as "no filter".

use crate::normalize::fold;

pub const RACES: &[(u32, &str)] = &[
    (1, "Humano"),
    (2, "Enano"),
    (3, "Elfo"),
    (4, "Elfo oscuro"),
    (5, "Gnomo"),
];

pub const CLASSES: &[(u32, &str)] = &[
    (38, "Mago"),
    (39, "Nigromante"),
    (41, "Paladin"),
    (42, "Clerigo"),
    (44, "Bardo"),
    (45, "Druida"),
    (47, "Asesino"),
    (48, "Cazador"),
    (50, "Arquero"),
    (51, "Guerrero"),
    (55, "Pirata"),
];

pub const FACTIONS: &[(u32, &str)] = &[(0, "Neutro"), (1, "Ciudadano"), (2, "Criminal")];

fn code_of(table: &[(u32, &str)], name: &str) -> Option<u32> {
    let wanted = fold(name);
    table
        .iter()
        .find(|(_, n)| fold(n) == wanted)
        .map(|(code, _)| *code)
}

fn name_of(table: &[(u32, &'static str)], code: u32) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

pub fn race_code(name: &str) -> Option<u32> {
    code_of(RACES, name)
}

pub fn class_code(name: &str) -> Option<u32> {
    code_of(CLASSES, name)
}

pub fn faction_code(name: &str) -> Option<u32> {
    code_of(FACTIONS, name)
}

pub fn race_name(code: u32) -> Option<&'static str> {
    name_of(RACES, code)
}

pub fn class_name(code: u32) -> Option<&'static str> {
    name_of(CLASSES, code)
}

pub fn faction_name(code: u32) -> Option<&'static str> {
    name_of(FACTIONS, code)
}
