//! Key-naming conventions shared by the primary record store and the
//! skill reverse index.
//!
//! Every key touching either structure is built or parsed here, so the two
//! sides cannot drift apart.

/// Prefix for employee record keys (`user:id:{employeeId}`).
pub const EMPLOYEE_KEY_PREFIX: &str = "user:id:";

/// Scan pattern matching every employee record key.
pub const EMPLOYEE_KEY_PATTERN: &str = "user:id:*";

/// Scan pattern matching every skill membership set key.
pub const SKILL_KEY_PATTERN: &str = "skill:*:employees";

/// Build the primary-store key for an employee id.
pub fn employee_key(id: &str) -> String {
    format!("{EMPLOYEE_KEY_PREFIX}{id}")
}

/// Build the reverse-index set key for a skill name.
pub fn skill_key(name: &str) -> String {
    format!("skill:{name}:employees")
}

/// Extract the employee id embedded in a `user:id:{id}` key.
pub fn employee_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(EMPLOYEE_KEY_PREFIX).filter(|id| !id.is_empty())
}

/// Extract the skill name embedded in a `skill:{name}:employees` key.
pub fn skill_from_key(key: &str) -> Option<&str> {
    key.strip_prefix("skill:")
        .and_then(|rest| rest.strip_suffix(":employees"))
        .filter(|name| !name.is_empty())
}
