//! Display strings for a roll.

use serde::Serialize;

use crate::roller::RollContext;

/// Separator for multi-valued display lines
pub const LIST_SEPARATOR: &str = " & ";

/// What a front end shows for a roll, already formatted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollDisplay {
    pub class: String,
    pub ascendancy: String,
    pub weapons: String,
    pub defense: String,
    pub defense_strategy: String,
    pub tactics: String,
    pub ailments: String,
    pub balance: String,
    pub build_name: String,
    pub flavor: String,
}

/// "Strength S%  |  Dexterity D%  |  Intelligence I%"
pub fn balance_text(ctx: &RollContext) -> String {
    let (s, d, i) = ctx.attributes.percentages();
    format!("Strength {s}%  |  Dexterity {d}%  |  Intelligence {i}%")
}

impl RollDisplay {
    pub fn from_context(ctx: &RollContext) -> Self {
        Self {
            class: ctx.class.clone(),
            ascendancy: ctx.ascendancy.clone(),
            weapons: ctx.weapon_line(),
            defense: ctx.defense.name.clone(),
            defense_strategy: ctx.defense_strategy.name.clone(),
            tactics: ctx.tactic_names().join(LIST_SEPARATOR),
            ailments: ctx.ailment_names().join(LIST_SEPARATOR),
            balance: balance_text(ctx),
            build_name: ctx.build_name.clone(),
            flavor: ctx.flavor.clone(),
        }
    }
}
