use std::path::{Path, PathBuf};

use crate::model::{ContentType, ReportKind, VulnType};
use crate::runner::CommandSpec;

pub const ANCHORE_CLI: &str = "anchore-cli";

/// One report file and the command producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportJob {
    pub kind: ReportKind,
    pub file_name: String,
    pub command: CommandSpec,
    pub ignore_exit_code: bool,
}

fn anchore_cli() -> CommandSpec {
    CommandSpec::new(ANCHORE_CLI).arg("--json")
}

pub fn add_image_command(image: &str) -> CommandSpec {
    anchore_cli().args(["image", "add", image])
}

/// Expand the selected report kinds into concrete jobs, in selection order.
/// Content reports produce one job per content type.
pub fn plan_reports(
    image: &str,
    kinds: &[ReportKind],
    content_types: &[ContentType],
    vuln_type: VulnType,
) -> Vec<ReportJob> {
    let mut jobs = Vec::new();
    for &kind in kinds {
        match kind {
            ReportKind::Content => {
                for content in content_types {
                    jobs.push(ReportJob {
                        kind,
                        file_name: format!("image-content-{content}-report.json"),
                        command: anchore_cli().args(["image", "content", image, content.as_str()]),
                        ignore_exit_code: kind.tolerates_failure(),
                    });
                }
            }
            ReportKind::Vuln => jobs.push(single(
                kind,
                anchore_cli().args(["image", "vuln", image, vuln_type.as_str()]),
            )),
            ReportKind::Details => jobs.push(single(kind, anchore_cli().args(["image", "get", image]))),
            ReportKind::Policy => jobs.push(single(
                kind,
                anchore_cli().args(["evaluate", "check", image, "--detail"]),
            )),
        }
    }
    jobs
}

fn single(kind: ReportKind, command: CommandSpec) -> ReportJob {
    ReportJob {
        kind,
        file_name: format!("image-{kind}-report.json"),
        command,
        ignore_exit_code: kind.tolerates_failure(),
    }
}

impl ReportJob {
    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.file_name)
    }
}
