pub(crate) use crate::runtime_env::read_env_var;

pub fn read_bool_env(name: &str, default: bool) -> bool {
    read_env_var(name)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(default)
}
