use crate::access::{Record, Value};
use crate::catalog::{CachedResolver, EntitySchema, FieldResolver, FieldType, Schema};
use crate::compiler::PredicateCompiler;
use crate::executor::{
    self, Executor, FilterExecutor, LimitExecutor, MemoryPredicateBuilder, SeqScanExecutor,
    SortCriteria, SortExecutor, SortOrder,
};
use crate::expression::{coerce_to, ExpressionError, ExpressionResult, Expressions, Operand};
use crate::paging::{Direction, Page, PageRequest, Sort};
use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// On-disk dataset: a schema plus initial records per entity
#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub schema: Schema,
    #[serde(default)]
    pub records: serde_json::Map<String, serde_json::Value>,
}

/// In-memory entity store queried with expression trees
pub struct Database {
    resolver: CachedResolver,
    tables: RwLock<HashMap<String, Arc<Vec<Record>>>>,
}

impl Database {
    /// Create an empty database over a validated schema
    pub fn new(schema: Schema) -> Result<Self> {
        schema.validate().context("Invalid schema")?;
        log::debug!("database opened with {} entities", schema.entities().len());
        Ok(Self {
            resolver: CachedResolver::new(Arc::new(schema)),
            tables: RwLock::new(HashMap::new()),
        })
    }

    /// Load a dataset file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Dataset file does not exist at {:?}", path);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {:?}", path))?;
        let dataset: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Dataset {:?} is not valid JSON", path))?;
        Self::from_dataset(&dataset)
    }

    /// Build a database from a dataset document, inserting its records in
    /// document order
    pub fn from_dataset(dataset: &serde_json::Value) -> Result<Self> {
        let dataset = Dataset::deserialize(dataset).context("Invalid dataset")?;
        let database = Self::new(dataset.schema)?;
        for (entity, rows) in &dataset.records {
            let Some(rows) = rows.as_array() else {
                bail!("Records for '{}' must be an array", entity);
            };
            for row in rows {
                database
                    .insert(entity, row)
                    .with_context(|| format!("Failed to insert {} record {}", entity, row))?;
            }
        }
        Ok(database)
    }

    pub fn schema(&self) -> &Schema {
        self.resolver.schema()
    }

    pub fn resolver(&self) -> &CachedResolver {
        &self.resolver
    }

    /// Insert a JSON object as a record of `entity`, returning the table size.
    ///
    /// Every field is coerced to its declared type; missing fields are NULL.
    /// Reference fields accept a nested object or the referenced identifier.
    pub fn insert(&self, entity: &str, object: &serde_json::Value) -> Result<usize> {
        let entity_schema = self.schema().entity(entity)?;
        let record = self.build_record(entity_schema, object)?;

        let mut tables = self.tables.write();
        let table = tables.entry(entity.to_string()).or_default();
        Arc::make_mut(table).push(record);
        Ok(table.len())
    }

    /// All records of `entity` matching `tree`, in insertion order
    pub fn find_all(&self, entity: &str, tree: &Expressions) -> Result<Vec<Record>> {
        let mut filter = self.filter(entity, tree)?;
        let records = executor::collect(&mut filter)?;
        log::debug!(
            "find_all {}: {} of {} records matched",
            entity,
            filter.matched(),
            filter.scanned()
        );
        Ok(records)
    }

    /// One sorted page of the records of `entity` matching `tree`
    pub fn find_page(
        &self,
        entity: &str,
        tree: &Expressions,
        request: &PageRequest,
    ) -> Result<Page<Record>> {
        request.validate()?;
        let criteria = self.sort_criteria(entity, &request.sort)?;

        let matches = self.find_all(entity, tree)?;
        let total = matches.len();

        let scan = SeqScanExecutor::new(Arc::new(matches));
        let sorted: Box<dyn Executor> = if criteria.is_empty() {
            Box::new(scan)
        } else {
            Box::new(SortExecutor::new(Box::new(scan), criteria))
        };
        let mut window = LimitExecutor::with_offset(sorted, request.size, request.offset());
        let content = executor::collect(&mut window)?;

        log::debug!(
            "find_page {}: page {} size {} returned {} of {}",
            entity,
            request.page,
            request.size,
            content.len(),
            total
        );
        Ok(Page::new(content, request, total))
    }

    /// Number of records of `entity` matching `tree`
    pub fn count(&self, entity: &str, tree: &Expressions) -> Result<usize> {
        let mut filter = self.filter(entity, tree)?;
        filter.init()?;
        while filter.next()?.is_some() {}
        Ok(filter.matched())
    }

    fn filter(&self, entity: &str, tree: &Expressions) -> Result<FilterExecutor> {
        let predicate =
            PredicateCompiler::new(&self.resolver, entity).compile(tree, &mut MemoryPredicateBuilder)?;
        let snapshot = self.snapshot(entity)?;
        Ok(FilterExecutor::new(
            Box::new(SeqScanExecutor::new(snapshot)),
            predicate,
        ))
    }

    fn snapshot(&self, entity: &str) -> Result<Arc<Vec<Record>>> {
        self.schema().entity(entity)?;
        Ok(self.tables.read().get(entity).cloned().unwrap_or_default())
    }

    fn sort_criteria(&self, entity: &str, sort: &Sort) -> Result<Vec<SortCriteria>> {
        sort.orders()
            .iter()
            .map(|order| {
                let field = self.resolver.resolve(entity, &order.property)?;
                let path = field.field_names().into_iter().map(String::from).collect();
                let direction = match order.direction {
                    Direction::Asc => SortOrder::Asc,
                    Direction::Desc => SortOrder::Desc,
                };
                Ok(SortCriteria::new(path, direction))
            })
            .collect()
    }

    fn build_record(
        &self,
        entity: &EntitySchema,
        object: &serde_json::Value,
    ) -> ExpressionResult<Record> {
        let fields = object.as_object().ok_or_else(|| {
            ExpressionError::malformed(format!("{} record must be a JSON object", entity.name))
        })?;
        if let Some(unknown) = fields.keys().find(|key| entity.field_type(key).is_none()) {
            return Err(ExpressionError::unknown_field(unknown.as_str()));
        }

        let mut record = Record::new();
        for field in &entity.fields {
            let value = match (fields.get(&field.name), &field.field_type) {
                (None, _) | (Some(serde_json::Value::Null), _) => Value::Null,
                (Some(raw), FieldType::Entity(target)) => self.build_reference(target, raw)?,
                (Some(raw), field_type) => coerce_to(&Operand::from_json(raw)?, field_type)?,
            };
            record.set(field.name.clone(), value);
        }
        Ok(record)
    }

    /// A nested object is built in place; a bare identifier embeds the stored
    /// record with that identifier, or an identifier-only record if absent.
    fn build_reference(&self, target: &str, raw: &serde_json::Value) -> ExpressionResult<Value> {
        let target = self.schema().entity(target)?;
        if raw.is_object() {
            return Ok(Value::Entity(Box::new(self.build_record(target, raw)?)));
        }

        let identifier = target
            .identifier
            .as_deref()
            .ok_or_else(|| ExpressionError::unknown_field(format!("{}.<identifier>", target.name)))?;
        let id_type = target
            .field_type(identifier)
            .ok_or_else(|| ExpressionError::unknown_field(identifier))?;
        let id = coerce_to(&Operand::from_json(raw)?, id_type)?;

        let stored = self.tables.read().get(&target.name).and_then(|table| {
            table
                .iter()
                .find(|record| record.get(identifier).is_some_and(|v| v.matches(&id)))
                .cloned()
        });
        let record = stored.unwrap_or_else(|| Record::new().with(identifier, id));
        Ok(Value::Entity(Box::new(record)))
    }
}
