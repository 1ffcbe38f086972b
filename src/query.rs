//! Query Service
//!
//! Read path over the store adapter: single-record lookups, full-collection
//! scans, and skill-intersection search joining reverse-index results
//! against primary records. Every operation is a single-shot
//! request/response with no cross-request state.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::store::keys::{EMPLOYEE_KEY_PATTERN, employee_key, skill_key};
use crate::store::{Store, StoreError};

/// Errors surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Requested employee id has no record.
    #[error("employee with ID {0} not found")]
    NotFound(String),

    /// Malformed or missing search parameter, rejected before store access.
    #[error("{0}")]
    BadRequest(String),

    /// Store connectivity or command failure; aborts the whole request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One search result: an employee possessing all requested skills.
///
/// `matching_skills` echoes the requested skill list, not the employee's
/// full assignment, which the index does not retain per employee.
#[derive(Debug, Clone, Serialize)]
pub struct SkillMatch {
    pub employee_id: String,
    pub employee_data: Value,
    pub matching_skills: Vec<String>,
}

/// Outcome of a skill search: the normalized requested skills plus the
/// employees matching all of them.
#[derive(Debug, Clone)]
pub struct SkillSearch {
    pub requested: Vec<String>,
    pub matches: Vec<SkillMatch>,
}

/// Read-only query facade over the store.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Store,
}

impl QueryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Fetch a single employee record by id.
    pub async fn get_employee(&self, id: &str) -> Result<Value, QueryError> {
        self.store
            .get(&employee_key(id))
            .await?
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }

    /// Fetch every employee record. Best-effort: records that cannot be
    /// resolved or parsed are dropped, not errors. Empty store yields an
    /// empty list.
    pub async fn list_employees(&self) -> Result<Vec<Value>, QueryError> {
        let mut keys = self.store.scan_keys(EMPLOYEE_KEY_PATTERN).await?;
        keys.sort();

        let mut employees = Vec::with_capacity(keys.len());
        for key in &keys {
            match self.store.get(key).await? {
                Some(record) => employees.push(record),
                None => {
                    tracing::debug!(key, "Dropping unresolvable employee record from listing");
                }
            }
        }
        Ok(employees)
    }

    /// Find employees possessing **all** of the comma-separated skills.
    ///
    /// Skill names are trimmed, lowercased and deduplicated; an input with
    /// no usable tokens is rejected before any store access. Matching ids
    /// are joined against primary records in ascending numeric order;
    /// non-numeric ids sort after numeric ones, lexicographically. Ids
    /// whose record cannot be resolved are dropped from the output.
    pub async fn search_by_skills(&self, skills_csv: &str) -> Result<SkillSearch, QueryError> {
        let requested = parse_skills(skills_csv);
        if requested.is_empty() {
            return Err(QueryError::BadRequest(
                "query parameter 'skills' must name at least one skill".to_string(),
            ));
        }

        let set_keys: Vec<String> = requested.iter().map(|s| skill_key(s)).collect();
        let mut ids: Vec<String> = self
            .store
            .set_intersect(&set_keys)
            .await?
            .into_iter()
            .collect();
        ids.sort_by(|a, b| compare_ids(a, b));

        let mut matches = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get(&employee_key(&id)).await? {
                Some(record) => matches.push(SkillMatch {
                    employee_id: id,
                    employee_data: record,
                    matching_skills: requested.clone(),
                }),
                None => {
                    tracing::debug!(employee = %id, "Indexed employee has no resolvable record, dropping");
                }
            }
        }

        Ok(SkillSearch { requested, matches })
    }
}

/// Parse a comma-separated skill list: trim, lowercase, drop empty tokens,
/// dedup preserving first occurrence.
fn parse_skills(raw: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let skill = token.trim().to_lowercase();
        if !skill.is_empty() && !skills.contains(&skill) {
            skills.push(skill);
        }
    }
    skills
}

/// Ascending numeric order for numeric ids; non-numeric ids follow, in
/// lexicographic order.
fn compare_ids(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn service_with(mem: &MemoryStore) -> QueryService {
        QueryService::new(Store::new(mem.clone()))
    }

    async fn seed_two_employee_scenario(mem: &MemoryStore) {
        mem.insert_document("user:id:1", json!({"id": "1", "name": "Ada"}));
        mem.insert_document("user:id:2", json!({"id": "2", "name": "Grace"}));
        let store = Store::new(mem.clone());
        store
            .set_add("skill:aws:employees", &["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        store
            .set_add("skill:docker:employees", &["1".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_employee_found_and_missing() {
        let mem = MemoryStore::new();
        mem.insert_document("user:id:1", json!({"id": "1", "name": "Ada"}));
        let service = service_with(&mem);

        let record = service.get_employee("1").await.unwrap();
        assert_eq!(record["name"], "Ada");

        let err = service.get_employee("404").await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_matches_get_and_drops_unparseable() {
        let mem = MemoryStore::new();
        mem.insert_document("user:id:1", json!({"id": "1"}));
        mem.insert_raw("user:id:2", r#"{"id":"2"}"#);
        mem.insert_raw("user:id:3", "corrupt");
        let service = service_with(&mem);

        let all = service.list_employees().await.unwrap();
        assert_eq!(all.len(), 2);
        for record in &all {
            let id = record["id"].as_str().unwrap();
            let single = service.get_employee(id).await.unwrap();
            assert_eq!(&single, record);
        }
    }

    #[tokio::test]
    async fn test_list_empty_store_is_success() {
        let service = service_with(&MemoryStore::new());
        assert!(service.list_employees().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_all_skills() {
        let mem = MemoryStore::new();
        seed_two_employee_scenario(&mem).await;
        let service = service_with(&mem);

        let result = service.search_by_skills("aws,docker").await.unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].employee_id, "1");
        assert_eq!(result.matches[0].matching_skills, vec!["aws", "docker"]);

        let aws_only = service.search_by_skills("aws").await.unwrap();
        assert_eq!(aws_only.matches.len(), 2);
    }

    #[tokio::test]
    async fn test_search_is_commutative() {
        let mem = MemoryStore::new();
        seed_two_employee_scenario(&mem).await;
        let service = service_with(&mem);

        let forward = service.search_by_skills("aws,docker").await.unwrap();
        let reverse = service.search_by_skills("docker,aws").await.unwrap();
        let forward_ids: Vec<_> = forward.matches.iter().map(|m| &m.employee_id).collect();
        let reverse_ids: Vec<_> = reverse.matches.iter().map(|m| &m.employee_id).collect();
        assert_eq!(forward_ids, reverse_ids);
    }

    #[tokio::test]
    async fn test_search_results_are_subset_of_listing() {
        let mem = MemoryStore::new();
        seed_two_employee_scenario(&mem).await;
        let service = service_with(&mem);

        let listed = service.list_employees().await.unwrap();
        let found = service.search_by_skills("aws").await.unwrap();
        for hit in &found.matches {
            assert!(listed.contains(&hit.employee_data));
        }
    }

    #[tokio::test]
    async fn test_search_normalizes_tokens() {
        let mem = MemoryStore::new();
        seed_two_employee_scenario(&mem).await;
        let service = service_with(&mem);

        let result = service.search_by_skills(" AWS , docker ,, aws").await.unwrap();
        assert_eq!(result.requested, vec!["aws", "docker"]);
        assert_eq!(result.matches.len(), 1);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_input() {
        let service = service_with(&MemoryStore::new());
        for raw in ["", "  ", ",", " , ,"] {
            let err = service.search_by_skills(raw).await.unwrap_err();
            assert!(matches!(err, QueryError::BadRequest(_)), "input {raw:?}");
        }
    }

    #[tokio::test]
    async fn test_search_unknown_skill_is_empty_success() {
        let mem = MemoryStore::new();
        seed_two_employee_scenario(&mem).await;
        let service = service_with(&mem);

        let result = service.search_by_skills("unknownskill").await.unwrap();
        assert!(result.matches.is_empty());
    }

    #[tokio::test]
    async fn test_search_sorts_numerically_then_lexicographically() {
        let mem = MemoryStore::new();
        for id in ["10", "2", "1", "zz", "abc"] {
            mem.insert_document(&format!("user:id:{id}"), json!({"id": id}));
        }
        let store = Store::new(mem.clone());
        let members: Vec<String> = ["10", "2", "1", "zz", "abc"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        store.set_add("skill:sql:employees", &members).await.unwrap();

        let service = service_with(&mem);
        let result = service.search_by_skills("sql").await.unwrap();
        let ids: Vec<_> = result.matches.iter().map(|m| m.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10", "abc", "zz"]);
    }

    #[tokio::test]
    async fn test_search_drops_members_without_records() {
        let mem = MemoryStore::new();
        mem.insert_document("user:id:1", json!({"id": "1"}));
        let store = Store::new(mem.clone());
        store
            .set_add("skill:ai:employees", &["1".to_string(), "77".to_string()])
            .await
            .unwrap();

        let service = service_with(&mem);
        let result = service.search_by_skills("ai").await.unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].employee_id, "1");
    }
}
