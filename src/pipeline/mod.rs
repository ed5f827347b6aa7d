pub mod clean;
pub mod enrich;
pub mod fetch;
pub mod final_clean;
pub mod merge;
pub mod sections;
pub mod translate;

use crate::apis::clearspending::{ContractsClient, KeyRing};
use crate::apis::open_sanctions::SanctionsClient;
use crate::apis::translate::TranslateClient;
use crate::common::constants::{
    CLEAN_OUTPUT, ENRICH_OUTPUT, FETCH_OUTPUT, FINAL_CLEAN_OUTPUT, MERGE_OUTPUT, TRANSLATE_OUTPUT,
};
use crate::common::error::{PipelineError, Result};
use crate::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Stage {
    Fetch,
    Clean,
    Enrich,
    Merge,
    FinalClean,
    Translate,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Fetch,
        Stage::Clean,
        Stage::Enrich,
        Stage::Merge,
        Stage::FinalClean,
        Stage::Translate,
    ];

    pub fn output_file(&self) -> &'static str {
        match self {
            Stage::Fetch => FETCH_OUTPUT,
            Stage::Clean => CLEAN_OUTPUT,
            Stage::Enrich => ENRICH_OUTPUT,
            Stage::Merge => MERGE_OUTPUT,
            Stage::FinalClean => FINAL_CLEAN_OUTPUT,
            Stage::Translate => TRANSLATE_OUTPUT,
        }
    }

    /// Files a stage reads; checked before a resumed run.
    fn input_files(&self) -> &'static [&'static str] {
        match self {
            Stage::Fetch => &[],
            Stage::Clean => &[FETCH_OUTPUT],
            Stage::Enrich => &[CLEAN_OUTPUT],
            Stage::Merge => &[CLEAN_OUTPUT, ENRICH_OUTPUT],
            Stage::FinalClean => &[MERGE_OUTPUT],
            Stage::Translate => &[FINAL_CLEAN_OUTPUT],
        }
    }
}

/// Everything a run needs. Credentials are optional so that a resumed run
/// only has to provide the ones its stages actually use.
pub struct RunContext {
    pub sanctions_key: Option<String>,
    pub contract_keys: Vec<String>,
    pub keywords: Vec<String>,
    pub credentials_path: PathBuf,
    pub config: Config,
}

/// Sequential stage runner. One stage runs to completion, its expected
/// output file is checked, and only then does the next stage start; a
/// missing output halts the whole run.
pub struct Runner {
    ctx: RunContext,
}

impl Runner {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub async fn run_from(&self, first: Stage) -> Result<()> {
        fs::create_dir_all(&self.ctx.config.output_dir)?;

        for input in first.input_files() {
            let path = self.path_for(input);
            if !path.exists() {
                return Err(PipelineError::MissingOutput(path.display().to_string()));
            }
        }

        for stage in Stage::ALL.into_iter().filter(|stage| *stage >= first) {
            self.run_stage(stage).await?;
            self.expect_output(stage)?;
        }

        println!("\n🎉 All steps completed successfully.");
        Ok(())
    }

    fn path_for(&self, file: &str) -> PathBuf {
        Path::new(&self.ctx.config.output_dir).join(file)
    }

    fn expect_output(&self, stage: Stage) -> Result<()> {
        let path = self.path_for(stage.output_file());
        if path.exists() {
            info!("File {} exists. Proceeding...", path.display());
            Ok(())
        } else {
            println!("❌ Error: file {} does not exist.", path.display());
            Err(PipelineError::MissingOutput(path.display().to_string()))
        }
    }

    async fn run_stage(&self, stage: Stage) -> Result<()> {
        let output = self.path_for(stage.output_file());
        println!("\n▶ Running {stage:?}... Output will be saved to {}", output.display());

        match stage {
            Stage::Fetch => {
                let key = self.ctx.sanctions_key.as_deref().ok_or_else(|| {
                    PipelineError::Config("a sanctions API key is required".to_string())
                })?;
                let client = SanctionsClient::new(key, self.ctx.config.sanctions_page_size);
                fetch::run_fetch(&client, &self.ctx.keywords, &output).await
            }
            Stage::Clean => clean::run_clean(&self.path_for(FETCH_OUTPUT), &output),
            Stage::Enrich => {
                let ring = KeyRing::new(self.ctx.contract_keys.clone())?;
                let mut client = ContractsClient::new(
                    ring,
                    self.ctx.config.contracts_page_size,
                    self.ctx.config.sign_date_gte.clone(),
                    self.ctx.config.sign_date_lte.clone(),
                );
                let delay = Duration::from_secs(self.ctx.config.request_delay_secs);
                enrich::run_enrich(&mut client, &self.path_for(CLEAN_OUTPUT), &output, delay).await
            }
            Stage::Merge => merge::run_merge(
                &self.path_for(CLEAN_OUTPUT),
                &self.path_for(ENRICH_OUTPUT),
                &output,
            ),
            Stage::FinalClean => {
                final_clean::run_final_clean(&self.path_for(MERGE_OUTPUT), &output)
            }
            Stage::Translate => {
                let client = TranslateClient::from_credentials_file(&self.ctx.credentials_path)?;
                translate::run_translate(
                    &client,
                    &self.path_for(FINAL_CLEAN_OUTPUT),
                    &output,
                    self.ctx.config.translate_rows,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_by_declaration() {
        assert!(Stage::Fetch < Stage::Clean);
        assert!(Stage::Enrich < Stage::Merge);
        assert!(Stage::FinalClean < Stage::Translate);
    }

    #[test]
    fn every_stage_input_is_some_earlier_output() {
        for (index, stage) in Stage::ALL.iter().enumerate() {
            for input in stage.input_files() {
                assert!(
                    Stage::ALL[..index].iter().any(|s| s.output_file() == *input),
                    "{stage:?} reads {input} which no earlier stage writes"
                );
            }
        }
    }
}
