//! Record generation pipeline shared by every record type.
//!
//! [`GeneratorCore`] owns the collaborators (descriptions, extraction
//! methods, mappings, outputs, recipes) and implements each pipeline stage.
//! [`RecordStages`] is what a record type plugs in: its seed, its section of
//! the description, and which optional stages apply. [`Generator`] runs the
//! stages for one identifier at a time.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use stacforge_describer::{
    Category, CollectionDescription, CollectionDescriptions, MemberOfLink, SectionDescription,
};
use stacforge_extraction::ExtractionRegistry;
use stacforge_outputs::{Mapping, MappingRegistry, Output, OutputRegistry, Recipe, Recipes};
use stacforge_shared::{
    AppConfig, GeneratorType, MethodConfig, MethodDefaults, MethodOptions, OutputRecord, Record,
    Result, StacForgeError,
};

use crate::asset::AssetStages;
use crate::collection::CollectionStages;
use crate::item::ItemStages;

/// Category assigned when no configured matcher fits.
pub const DEFAULT_CATEGORY: &str = "data";

/// Record keys written by the pipeline itself.
pub const CATEGORIES_KEY: &str = "categories";
pub const DESCRIPTION_PATH_KEY: &str = "description_path";
pub const MEMBER_OF_KEY: &str = "member_of";

/// Option every id method is handed so it writes `<type>_id`.
const OUTPUT_KEY_OPTION: &str = "output_key";

// ---------------------------------------------------------------------------
// GeneratorCore
// ---------------------------------------------------------------------------

/// Collaborators and stage implementations shared by all record types.
pub struct GeneratorCore {
    descriptions: CollectionDescriptions,
    extraction: ExtractionRegistry,
    mappings: Vec<Box<dyn Mapping>>,
    outputs: Vec<Box<dyn Output>>,
    recipes: Recipes,
    default_id_methods: BTreeMap<GeneratorType, MethodConfig>,
    method_defaults: MethodDefaults,
    category_patterns: CategoryPatterns,
}

impl GeneratorCore {
    /// A core with built-in extraction methods, the default id methods and no
    /// mappings, outputs or recipes.
    pub fn new(descriptions: CollectionDescriptions) -> Self {
        let default_id_methods =
            typed_id_methods(&AppConfig::default().default_id_methods).unwrap_or_default();

        Self {
            descriptions,
            extraction: ExtractionRegistry::builtin(),
            mappings: Vec::new(),
            outputs: Vec::new(),
            recipes: Recipes::default(),
            default_id_methods,
            method_defaults: MethodDefaults::default(),
            category_patterns: CategoryPatterns::default(),
        }
    }

    /// Build everything the configuration names. Any failure here is
    /// operator misconfiguration and aborts start-up.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let descriptions =
            CollectionDescriptions::from_root(&config.description_root, config.cache_capacity)?;

        let core = Self {
            descriptions,
            extraction: ExtractionRegistry::builtin(),
            mappings: MappingRegistry::builtin().build_all(&config.mappings)?,
            outputs: OutputRegistry::builtin().build_all(&config.outputs)?,
            recipes: Recipes::load(&config.recipes_root)?,
            default_id_methods: typed_id_methods(&config.default_id_methods)?,
            method_defaults: MethodDefaults::from(config),
            category_patterns: CategoryPatterns::default(),
        };

        info!(
            mappings = core.mappings.len(),
            outputs = core.outputs.len(),
            "generator ready"
        );
        Ok(core)
    }

    pub fn with_extraction_registry(mut self, registry: ExtractionRegistry) -> Self {
        self.extraction = registry;
        self
    }

    pub fn with_mappings(mut self, mappings: Vec<Box<dyn Mapping>>) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Box<dyn Output>>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_recipes(mut self, recipes: Recipes) -> Self {
        self.recipes = recipes;
        self
    }

    /// Replace (or with `None`, remove) the fallback id method for `ty`.
    pub fn with_default_id_method(
        mut self,
        ty: GeneratorType,
        conf: Option<MethodConfig>,
    ) -> Self {
        match conf {
            Some(conf) => self.default_id_methods.insert(ty, conf),
            None => self.default_id_methods.remove(&ty),
        };
        self
    }

    pub fn with_method_defaults(mut self, defaults: MethodDefaults) -> Self {
        self.method_defaults = defaults;
        self
    }

    pub fn descriptions(&self) -> &CollectionDescriptions {
        &self.descriptions
    }

    pub fn recipes(&self) -> &Recipes {
        &self.recipes
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    /// Run `methods` in order against `record`.
    ///
    /// A method that cannot be built or fails is logged and skipped; the
    /// fields it declares are removed so nothing half-written survives.
    pub fn run_extraction_methods(
        &self,
        record: &mut Record,
        methods: &[MethodConfig],
        overrides: &MethodOptions,
    ) {
        for conf in methods {
            let options = self.method_defaults.options_for(conf, overrides);
            let method = match self.extraction.build(&conf.method, &options) {
                Ok(method) => method,
                Err(e) => {
                    warn!(method = %conf.method, error = %e, "skipping extraction method");
                    continue;
                }
            };

            if let Err(e) = method.run(record) {
                let cleared = method.output_keys();
                warn!(
                    method = method.name(),
                    error = %e,
                    cleared = ?cleared,
                    "extraction method failed"
                );
                for key in &cleared {
                    record.remove(key);
                }
            }
        }
    }

    /// Produce the `<ty>_id` for a record.
    ///
    /// Uses `conf` when the description provides one, otherwise the default
    /// id method for `ty`. The method runs on a copy of `record`, so only the
    /// returned id escapes.
    pub fn run_id_method(
        &self,
        ty: GeneratorType,
        uri: &str,
        record: &Record,
        conf: Option<&MethodConfig>,
    ) -> Result<String> {
        let conf = conf
            .or_else(|| self.default_id_methods.get(&ty))
            .ok_or_else(|| {
                StacForgeError::identification(ty.as_str(), uri, "no id method configured")
            })?;

        let id_key = ty.id_key();
        let options = self.method_defaults.options_for(conf, &id_override(&id_key));
        let method = self
            .extraction
            .build(&conf.method, &options)
            .map_err(|e| StacForgeError::identification(ty.as_str(), uri, e.to_string()))?;

        let mut scratch = record.clone();
        method
            .run(&mut scratch)
            .map_err(|e| StacForgeError::identification(ty.as_str(), uri, e.to_string()))?;

        take_id(&mut scratch, &id_key).ok_or_else(|| {
            StacForgeError::identification(
                ty.as_str(),
                uri,
                format!("id method `{}` produced no `{id_key}`", conf.method),
            )
        })
    }

    /// Labels of every category whose pattern matches `uri` from its start,
    /// deduplicated in declaration order, or `[DEFAULT_CATEGORY]`.
    pub fn categorize(&self, uri: &str, categories: &[Category]) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();

        for category in categories {
            let Some(regex) = self.category_patterns.compiled(category) else {
                continue;
            };
            if regex.is_match(uri) && !labels.contains(&category.label) {
                labels.push(category.label.clone());
            }
        }

        if labels.is_empty() {
            labels.push(DEFAULT_CATEGORY.to_string());
        }
        labels
    }

    /// Resolve each parent link and record it under `member_of`.
    ///
    /// For every link, its extraction chain runs against `record`, the
    /// resulting `<parent type>_id` is removed from the record and kept in
    /// the `member_of` map as `parent id → grouping key`. Returns the parent
    /// ids in link order.
    pub fn fold_member_of(
        &self,
        ty: GeneratorType,
        uri: &str,
        record: &mut Record,
        links: &[MemberOfLink],
    ) -> Result<Vec<String>> {
        let mut parents = Vec::with_capacity(links.len());
        let mut member_of = Record::new();

        for link in links {
            let id_key = link.link_type.id_key();
            self.run_extraction_methods(record, &link.id, &id_override(&id_key));

            let parent = take_id(record, &id_key).ok_or_else(|| {
                StacForgeError::identification(
                    ty.as_str(),
                    uri,
                    format!("member_of `{}` link produced no `{id_key}`", link.key),
                )
            })?;

            debug!(parent = %parent, key = %link.key, parent_type = %link.link_type, "member of");
            member_of.insert(parent.clone(), link.key.clone().into());
            parents.push(parent);
        }

        if !member_of.is_empty() {
            record.insert(MEMBER_OF_KEY.into(), Value::Object(member_of));
        }
        Ok(parents)
    }

    /// Run every configured mapping in order.
    pub fn map(&self, record: Record, recipe: &Recipe) -> Result<Record> {
        self.mappings
            .iter()
            .try_fold(record, |record, mapping| mapping.run(record, recipe))
    }

    /// Hand the finished record to every configured output.
    pub fn output(&self, record: &OutputRecord) -> Result<()> {
        for output in &self.outputs {
            output.run(record)?;
        }
        Ok(())
    }

    /// Flush every buffering output. All are flushed even if one fails; the
    /// first failure is returned.
    pub fn finished(&self) -> Result<()> {
        let mut first_error = None;
        for output in self.outputs.iter().filter(|o| o.is_buffered()) {
            if let Err(e) = output.flush() {
                warn!(output = output.name(), error = %e, "flush failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn typed_id_methods(
    methods: &BTreeMap<String, MethodConfig>,
) -> Result<BTreeMap<GeneratorType, MethodConfig>> {
    methods
        .iter()
        .map(|(key, conf)| {
            let ty = key.parse::<GeneratorType>().map_err(StacForgeError::config)?;
            Ok((ty, conf.clone()))
        })
        .collect()
}

fn id_override(id_key: &str) -> MethodOptions {
    let mut overrides = MethodOptions::new();
    overrides.insert(OUTPUT_KEY_OPTION.into(), id_key.into());
    overrides
}

/// Remove `key` from `record` as an identifier string.
fn take_id(record: &mut Record, key: &str) -> Option<String> {
    match record.remove(key)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Category patterns compiled once per distinct pattern. Invalid patterns
/// are remembered as `None` so they are reported once.
#[derive(Debug, Default)]
struct CategoryPatterns {
    compiled: Mutex<HashMap<String, Option<Regex>>>,
}

impl CategoryPatterns {
    fn compiled(&self, category: &Category) -> Option<Regex> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        compiled
            .entry(category.regex.clone())
            .or_insert_with(|| match Regex::new(&format!("^(?:{})", category.regex)) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(
                        label = %category.label,
                        regex = %category.regex,
                        error = %e,
                        "invalid category regex"
                    );
                    None
                }
            })
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// ---------------------------------------------------------------------------
// RecordStages
// ---------------------------------------------------------------------------

/// The parts of the pipeline a record type decides.
///
/// Every method except [`RecordStages::generator_type`] has a default that
/// fits a plain record with no parent.
pub trait RecordStages: Send + Sync {
    fn generator_type(&self) -> GeneratorType;

    /// Initial working record.
    fn seed_record(&self, uri: &str) -> Record {
        let mut record = Record::new();
        record.insert("type".into(), self.generator_type().as_str().into());
        record.insert("uri".into(), uri.into());
        record
    }

    /// The description section supplying extraction and id configuration.
    fn section<'a>(
        &self,
        description: &'a CollectionDescription,
    ) -> Option<&'a SectionDescription> {
        description.section(self.generator_type())
    }

    /// Whether the most specific covering description path is recorded.
    fn selects_description_path(&self) -> bool {
        false
    }

    /// Produce the record's own id. Implementations may also leave further
    /// identifiers in the record.
    fn resolve_identifiers(
        &self,
        core: &GeneratorCore,
        uri: &str,
        record: &mut Record,
        description: &CollectionDescription,
    ) -> Result<String> {
        let conf = self.section(description).and_then(|s| s.id.as_ref());
        core.run_id_method(self.generator_type(), uri, record, conf)
    }

    /// Category labels, when this record type is categorized.
    fn categorize(
        &self,
        _core: &GeneratorCore,
        _uri: &str,
        _description: &CollectionDescription,
    ) -> Option<Vec<String>> {
        None
    }

    /// Parent ids from `member_of` links, in link order.
    fn fold_membership(
        &self,
        _core: &GeneratorCore,
        _uri: &str,
        _record: &mut Record,
        _description: &CollectionDescription,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Routing parent for the output record.
    fn parent_id(&self, _record: &Record, _parents: &[String]) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Generates records of one type.
pub struct Generator {
    core: GeneratorCore,
    stages: Box<dyn RecordStages>,
}

impl Generator {
    pub fn new(core: GeneratorCore, stages: impl RecordStages + 'static) -> Self {
        Self {
            core,
            stages: Box::new(stages),
        }
    }

    /// The built-in generator for `ty`.
    pub fn for_type(ty: GeneratorType, core: GeneratorCore) -> Self {
        match ty {
            GeneratorType::Asset => Self::new(core, AssetStages),
            GeneratorType::Item => Self::new(core, ItemStages),
            GeneratorType::Collection => Self::new(core, CollectionStages),
        }
    }

    pub fn generator_type(&self) -> GeneratorType {
        self.stages.generator_type()
    }

    pub fn core(&self) -> &GeneratorCore {
        &self.core
    }

    /// Build, map and output the record for one dataset identifier.
    ///
    /// Extraction failures degrade the record; a missing id, a mapping or an
    /// output failure drops it. The returned record is what outputs received.
    #[instrument(skip(self), fields(record_type = %self.stages.generator_type()))]
    pub fn process(&self, uri: &str) -> Result<OutputRecord> {
        let ty = self.stages.generator_type();
        let mut record = self.stages.seed_record(uri);

        let description = self.core.descriptions.get_description(uri)?;
        info!(paths = ?description.paths, "processing");

        let description_path = if self.stages.selects_description_path() {
            description.most_specific_path(uri)
        } else {
            None
        };
        if let Some(path) = &description_path {
            record.insert(DESCRIPTION_PATH_KEY.into(), path.clone().into());
        }

        if let Some(section) = self.stages.section(&description) {
            let no_overrides = MethodOptions::new();
            self.core
                .run_extraction_methods(&mut record, &section.extraction_methods, &no_overrides);
            self.core.run_extraction_methods(
                &mut record,
                &section.post_extraction_methods,
                &no_overrides,
            );
        }

        let id = self
            .stages
            .resolve_identifiers(&self.core, uri, &mut record, &description)?;

        let categories = self.stages.categorize(&self.core, uri, &description);
        if let Some(labels) = &categories {
            record.insert(CATEGORIES_KEY.into(), labels.clone().into());
        }

        let parents = self
            .stages
            .fold_membership(&self.core, uri, &mut record, &description)?;
        let parent_id = self.stages.parent_id(&record, &parents);

        let recipe =
            self.core
                .recipes
                .recipe_for(ty, description_path, categories.unwrap_or_default());
        let body = self.core.map(record, &recipe)?;

        let output = OutputRecord {
            id,
            parent_id,
            record_type: ty,
            uri: uri.to_string(),
            body,
        };
        self.core.output(&output)?;

        info!(id = %output.id, parent_id = ?output.parent_id, "record generated");
        Ok(output)
    }

    /// End of batch: flush buffering outputs.
    pub fn finished(&self) -> Result<()> {
        self.core.finished()
    }
}
