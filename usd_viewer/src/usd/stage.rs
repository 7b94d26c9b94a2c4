/// Stage: the prim hierarchy of a single `.usda` layer
///
/// Prims live in a slot map with an index from path to key. Composition arcs
/// (references, payloads, inherits, specializes, variant sets, sublayers) are
/// recorded and reported but not composed.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::error::Result;
use crate::sdf::SdfPath;
use crate::usd::usda::{self, Layer, Metadatum, PrimSpec, PropertySpec, Variability};
use crate::usd::{InitialLoadSet, Prim, SceneStage, Specifier, TimeCode, Value};
use crate::viewer_warn;

new_key_type! {
    /// Stable key of a prim inside its stage
    pub struct PrimKey;
}

/// Metadata keys that introduce composition arcs.
const COMPOSITION_KEYS: [&str; 5] = ["references", "payload", "inherits", "specializes", "variantSets"];

// ===== ATTRIBUTE =====

/// Authored attribute with its default value and time samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub type_name: String,
    pub variability: Variability,
    pub default: Option<Value>,
    /// Sorted by time
    pub time_samples: Vec<(f64, Value)>,
    /// Attribute metadata block (`interpolation`, `doc`, ...)
    pub metadata: Vec<Metadatum>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            variability: Variability::Varying,
            default: None,
            time_samples: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.push(Metadatum { key: key.into(), list_op: None, value: value.into() });
        self
    }

    /// Metadata value by key.
    pub fn metadatum(&self, key: &str) -> Option<&Value> {
        self.metadata.iter().find(|m| m.key == key).map(|m| &m.value)
    }

    pub fn with_time_samples(mut self, mut samples: Vec<(f64, Value)>) -> Self {
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.time_samples = samples;
        self
    }

    /// True when any value (default or sample) is authored.
    pub fn has_authored_value(&self) -> bool {
        self.default.is_some() || !self.time_samples.is_empty()
    }

    /// Resolve the value at `time`.
    ///
    /// Uniform attributes and `TimeCode::Default` read the default value only.
    pub fn get(&self, time: TimeCode) -> Option<Value> {
        let resolved = match time {
            TimeCode::Numeric(t)
                if self.variability == Variability::Varying && !self.time_samples.is_empty() =>
            {
                self.sample_at(t)
            }
            _ => self.default.clone(),
        };
        resolved.filter(|v| !v.is_blocked())
    }

    fn sample_at(&self, time: f64) -> Option<Value> {
        let samples = &self.time_samples;
        let upper = samples.partition_point(|(t, _)| *t <= time);
        if upper == 0 {
            return samples.first().map(|(_, v)| v.clone());
        }
        let (t0, v0) = &samples[upper - 1];
        let Some((t1, v1)) = samples.get(upper) else {
            return Some(v0.clone());
        };
        if *t0 == time || v0.is_blocked() || v1.is_blocked() {
            return Some(v0.clone());
        }
        let alpha = (time - t0) / (t1 - t0);
        v0.lerp(v1, alpha).or_else(|| Some(v0.clone()))
    }
}

// ===== PRIM STORAGE =====

#[derive(Debug, Clone)]
struct PrimData {
    path: SdfPath,
    specifier: Specifier,
    type_name: String,
    metadata: Vec<Metadatum>,
    attributes: Vec<Attribute>,
    relationships: Vec<(String, Vec<String>)>,
    children: Vec<PrimKey>,
}

impl PrimData {
    fn new(path: SdfPath, specifier: Specifier, type_name: String) -> Self {
        Self {
            path,
            specifier,
            type_name,
            metadata: Vec::new(),
            attributes: Vec::new(),
            relationships: Vec::new(),
            children: Vec::new(),
        }
    }

    fn handle(&self) -> Prim {
        Prim::new(self.path.clone(), self.type_name.clone(), self.specifier)
    }
}

// ===== STAGE =====

/// In-memory stage built from one layer.
#[derive(Debug, Clone)]
pub struct Stage {
    identifier: String,
    load_set: InitialLoadSet,
    metadata: Vec<Metadatum>,
    prims: SlotMap<PrimKey, PrimData>,
    index: FxHashMap<SdfPath, PrimKey>,
    root: PrimKey,
    ignored_arcs: Vec<String>,
}

impl Stage {
    /// Empty stage holding only the pseudo-root.
    pub fn new(identifier: impl Into<String>, load_set: InitialLoadSet) -> Self {
        let mut prims = SlotMap::with_key();
        let root_path = SdfPath::absolute_root();
        let root = prims.insert(PrimData::new(root_path.clone(), Specifier::Def, String::new()));
        let mut index = FxHashMap::default();
        index.insert(root_path, root);

        Self {
            identifier: identifier.into(),
            load_set,
            metadata: Vec::new(),
            prims,
            index,
            root,
            ignored_arcs: Vec::new(),
        }
    }

    /// Parse `.usda` text and build a stage from it.
    pub fn from_source(identifier: &str, source: &str, load_set: InitialLoadSet) -> Result<Self> {
        let layer = usda::parse_layer(source)?;
        Self::from_layer(identifier, layer, load_set)
    }

    /// Build a stage from a parsed layer.
    pub fn from_layer(identifier: &str, layer: Layer, load_set: InitialLoadSet) -> Result<Self> {
        let mut stage = Self::new(identifier, load_set);

        for entry in &layer.metadata {
            if entry.key == "subLayers" {
                stage.record_ignored_arc(&SdfPath::absolute_root(), &entry.key);
            }
        }
        stage.metadata = layer.metadata;

        let root = stage.root;
        for spec in layer.prims {
            stage.add_prim_spec(root, spec)?;
        }

        Ok(stage)
    }

    fn add_prim_spec(&mut self, parent: PrimKey, spec: PrimSpec) -> Result<PrimKey> {
        let path = self.prims[parent].path.append_child(&spec.name)?;

        let key = match self.index.get(&path) {
            Some(&existing) => {
                // a later spec for the same path: `def` wins over `over`
                let data = &mut self.prims[existing];
                if spec.specifier != Specifier::Over {
                    data.specifier = spec.specifier;
                }
                if !spec.type_name.is_empty() {
                    data.type_name = spec.type_name.clone();
                }
                existing
            }
            None => {
                let data = PrimData::new(path.clone(), spec.specifier, spec.type_name.clone());
                let key = self.prims.insert(data);
                self.index.insert(path.clone(), key);
                self.prims[parent].children.push(key);
                key
            }
        };

        for entry in &spec.metadata {
            if COMPOSITION_KEYS.contains(&entry.key.as_str()) {
                self.record_ignored_arc(&path, &entry.key);
            }
        }
        if !spec.variant_sets.is_empty() {
            self.record_ignored_arc(&path, "variantSet");
        }

        let data = &mut self.prims[key];
        data.metadata.extend(spec.metadata);
        for property in spec.properties {
            match property {
                PropertySpec::Attribute(attr) => {
                    let merged = Attribute {
                        name: attr.name,
                        type_name: attr.type_name,
                        variability: attr.variability,
                        default: attr.default,
                        time_samples: attr.time_samples,
                        metadata: attr.metadata,
                    };
                    match data.attributes.iter_mut().find(|a| a.name == merged.name) {
                        Some(slot) => *slot = merged,
                        None => data.attributes.push(merged),
                    }
                }
                PropertySpec::Relationship(rel) => {
                    data.relationships.retain(|(name, _)| name != &rel.name);
                    data.relationships.push((rel.name, rel.targets));
                }
            }
        }

        for child in spec.children {
            self.add_prim_spec(key, child)?;
        }

        Ok(key)
    }

    fn record_ignored_arc(&mut self, path: &SdfPath, kind: &str) {
        viewer_warn!(
            "usd_viewer::Stage",
            "Composition arc '{}' on {} is not supported and was ignored ({})",
            kind,
            path,
            self.identifier
        );
        self.ignored_arcs.push(format!("{}: {}", path, kind));
    }

    /// Author a prim (and any missing typeless ancestors) programmatically.
    pub fn define_prim(&mut self, path: &SdfPath, type_name: &str) -> Result<Prim> {
        let mut current = self.root;
        let mut current_path = SdfPath::absolute_root();
        for element in path.elements() {
            current_path = current_path.append_child(element)?;
            current = match self.index.get(&current_path) {
                Some(&key) => key,
                None => {
                    let key = self.prims.insert(PrimData::new(
                        current_path.clone(),
                        Specifier::Def,
                        String::new(),
                    ));
                    self.index.insert(current_path.clone(), key);
                    self.prims[current].children.push(key);
                    key
                }
            };
        }
        let data = &mut self.prims[current];
        data.specifier = Specifier::Def;
        data.type_name = type_name.to_string();
        Ok(data.handle())
    }

    /// Author (or replace) an attribute on an existing prim. Returns false
    /// when no prim exists at `path`.
    pub fn set_attribute(&mut self, path: &SdfPath, attribute: Attribute) -> bool {
        let Some(&key) = self.index.get(path) else {
            return false;
        };
        let data = &mut self.prims[key];
        match data.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(slot) => *slot = attribute,
            None => data.attributes.push(attribute),
        }
        true
    }

    /// Layer identifier (the path the stage was opened from).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn load_set(&self) -> InitialLoadSet {
        self.load_set
    }

    /// Layer metadata value by key.
    pub fn layer_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.iter().find(|m| m.key == key).map(|m| &m.value)
    }

    /// Prim named by the `defaultPrim` layer metadata.
    pub fn default_prim(&self) -> Option<Prim> {
        let name = self.layer_metadata("defaultPrim")?.as_str()?;
        let path = SdfPath::absolute_root().append_child(name).ok()?;
        self.prim_at_path(&path)
    }

    /// `upAxis` layer metadata, `"Y"` when unauthored.
    pub fn up_axis(&self) -> &str {
        self.layer_metadata("upAxis").and_then(Value::as_str).unwrap_or("Y")
    }

    /// `metersPerUnit` layer metadata, `0.01` when unauthored.
    pub fn meters_per_unit(&self) -> f64 {
        self.layer_metadata("metersPerUnit").and_then(Value::as_f64).unwrap_or(0.01)
    }

    /// Number of prims, pseudo-root excluded.
    pub fn prim_count(&self) -> usize {
        self.prims.len() - 1
    }

    /// Defined, non-abstract prims in depth-first order, pseudo-root excluded.
    pub fn traverse(&self) -> Vec<Prim> {
        let mut out = Vec::new();
        let mut stack: Vec<PrimKey> = self.prims[self.root].children.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let data = &self.prims[key];
            if data.specifier != Specifier::Def {
                continue;
            }
            out.push(data.handle());
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    /// Authored attribute spec, including its time samples.
    pub fn attribute_spec(&self, prim: &Prim, name: &str) -> Option<&Attribute> {
        self.data(prim)?.attributes.iter().find(|a| a.name == name)
    }

    /// Targets of a relationship, empty when not authored.
    pub fn relationship_targets(&self, prim: &Prim, name: &str) -> Vec<String> {
        self.data(prim)
            .and_then(|d| d.relationships.iter().find(|(n, _)| n == name))
            .map(|(_, targets)| targets.clone())
            .unwrap_or_default()
    }

    /// Prim metadata value by key.
    pub fn prim_metadata(&self, prim: &Prim, key: &str) -> Option<&Value> {
        self.data(prim)?.metadata.iter().find(|m| m.key == key).map(|m| &m.value)
    }

    /// Composition arcs that were present in the layer but not composed.
    pub fn ignored_composition_arcs(&self) -> &[String] {
        &self.ignored_arcs
    }

    fn data(&self, prim: &Prim) -> Option<&PrimData> {
        self.index.get(prim.path()).map(|&key| &self.prims[key])
    }
}

impl SceneStage for Stage {
    fn pseudo_root(&self) -> Prim {
        self.prims[self.root].handle()
    }

    fn prim_at_path(&self, path: &SdfPath) -> Option<Prim> {
        self.index.get(path).map(|&key| self.prims[key].handle())
    }

    fn children(&self, prim: &Prim) -> Vec<Prim> {
        self.data(prim)
            .map(|d| d.children.iter().map(|&key| self.prims[key].handle()).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, prim: &Prim, name: &str, time: TimeCode) -> Option<Value> {
        self.attribute_spec(prim, name)?.get(time)
    }

    fn attribute_metadata(&self, prim: &Prim, name: &str, key: &str) -> Option<Value> {
        self.attribute_spec(prim, name)?.metadatum(key).cloned()
    }

    fn attribute_names(&self, prim: &Prim) -> Vec<String> {
        self.data(prim)
            .map(|d| d.attributes.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
