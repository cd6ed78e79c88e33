use kiln_pipeline::{
    OutputOptions, Pipeline, RuleSpec, RuleTable, TransformSettings, TransformerRegistry,
};

use crate::config::KilnConfig;
use crate::config::types::RuleConfig;
use crate::error::Result;

// Conversions: config types -> pipeline types

impl From<&RuleConfig> for RuleSpec {
    fn from(rule: &RuleConfig) -> Self {
        RuleSpec {
            test: rule.test.clone(),
            exclude: rule.exclude.clone(),
            stages: rule.stages.clone(),
        }
    }
}

impl From<&RuleSpec> for RuleConfig {
    fn from(spec: &RuleSpec) -> Self {
        RuleConfig {
            test: spec.test.clone(),
            exclude: spec.exclude.clone(),
            stages: spec.stages.clone(),
        }
    }
}

impl KilnConfig {
    pub fn rule_specs(&self) -> Vec<RuleSpec> {
        self.rules.iter().map(RuleSpec::from).collect()
    }

    pub fn transform_settings(&self) -> TransformSettings {
        TransformSettings {
            target: self.target.clone(),
            minify: self.minify,
        }
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            bundle_filename: self.output_filename.clone(),
            style_filename: self.style_filename.clone(),
            split_styles: self.split_styles,
        }
    }

    /// Build the transformer registry and compile the rule table.
    pub fn compile_rules(&self) -> Result<RuleTable> {
        let registry = TransformerRegistry::with_defaults(&self.transform_settings())?;
        Ok(RuleTable::compile(
            &self.rule_specs(),
            &self.exclude,
            &registry,
        )?)
    }

    /// Compile the rules and wrap them in a [`Pipeline`].
    pub fn pipeline(&self) -> Result<Pipeline> {
        Ok(Pipeline::new(self.compile_rules()?, self.output_options()))
    }
}
