use redis::Script;
use std::sync::LazyLock;

pub const MUTATION_PLAN_SCRIPT_BODY: &str = include_str!("../../lua/mutation_plan.lua");

pub static MUTATION_PLAN_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(MUTATION_PLAN_SCRIPT_BODY));
