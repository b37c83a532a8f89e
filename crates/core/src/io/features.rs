//! JSON feature documents.
//!
//! A document is the serialized [`FeatureCollection`], schema included, so
//! reopening a written file restores field types and CRS exactly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::vector::{Feature, FeatureCollection};

/// Write a feature collection as a JSON document
pub fn write_features<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    debug!(
        path = %path.as_ref().display(),
        features = collection.len(),
        "writing feature document"
    );
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection)?;
    writer.flush()?;
    Ok(())
}

/// Read a feature collection previously written by [`write_features`]
pub fn read_features<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Shorten attribute names to `max_len` characters the way DBF-backed
/// formats do, suffixing a counter when two names collide after truncation.
///
/// Both the schema and every feature's properties are renamed.
pub fn truncate_field_names(collection: FeatureCollection, max_len: usize) -> FeatureCollection {
    let mut schema = collection.schema().clone();
    let mut renames: HashMap<String, String> = HashMap::new();
    let mut taken: Vec<String> = Vec::new();

    for field in schema.fields_mut().iter_mut() {
        let mut candidate: String = field.name.chars().take(max_len).collect();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            let tail = suffix.to_string();
            let head: String = field
                .name
                .chars()
                .take(max_len.saturating_sub(tail.len()))
                .collect();
            candidate = format!("{}{}", head, tail);
            suffix += 1;
        }
        taken.push(candidate.clone());
        if candidate != field.name {
            renames.insert(field.name.clone(), candidate.clone());
            field.name = candidate;
        }
    }

    if renames.is_empty() {
        return collection;
    }

    let features: Vec<Feature> = collection
        .into_iter()
        .map(|mut feature| {
            feature.properties = feature
                .properties
                .into_iter()
                .map(|(k, v)| (renames.get(&k).cloned().unwrap_or(k), v))
                .collect();
            feature
        })
        .collect();
    FeatureCollection::with_features(schema, features)
}
