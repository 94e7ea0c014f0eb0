use crate::catalog::{FieldDescriptor, FieldResolver, Schema};
use crate::expression::ExpressionResult;
use dashmap::DashMap;
use std::sync::Arc;

/// Field resolver that memoizes successful resolutions per (entity, path).
///
/// Safe to share between threads; failed resolutions are not cached.
#[derive(Debug)]
pub struct CachedResolver {
    schema: Arc<Schema>,
    resolved: DashMap<(String, String), FieldDescriptor>,
}

impl CachedResolver {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            resolved: DashMap::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn cached_len(&self) -> usize {
        self.resolved.len()
    }
}

impl FieldResolver for CachedResolver {
    fn resolve(&self, entity: &str, path: &str) -> ExpressionResult<FieldDescriptor> {
        let key = (entity.to_string(), path.to_string());
        if let Some(hit) = self.resolved.get(&key) {
            return Ok(hit.value().clone());
        }

        let descriptor = self.schema.resolve(entity, path)?;
        self.resolved.insert(key, descriptor.clone());
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::employee_schema;
    use std::thread;

    #[test]
    fn test_cache_hits_match_schema() {
        let schema = Arc::new(employee_schema());
        let resolver = CachedResolver::new(schema.clone());

        let first = resolver.resolve("Employee", "department.name").unwrap();
        let second = resolver.resolve("Employee", "department.name").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, schema.resolve("Employee", "department.name").unwrap());
        assert_eq!(resolver.cached_len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let resolver = CachedResolver::new(Arc::new(employee_schema()));
        assert!(resolver.resolve("Employee", "invalidFieldName").is_err());
        assert!(resolver.resolve("Employee", "invalidFieldName").is_err());
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn test_concurrent_resolution() {
        let resolver = Arc::new(CachedResolver::new(Arc::new(employee_schema())));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    for path in ["firstName", "age", "department", "department.name"] {
                        resolver.resolve("Employee", path).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(resolver.cached_len(), 4);
    }
}
