use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{DispatchError, Result};
use crate::scheduler::source::INPUT_EXTENSION;

/// Default name of the VEP executable, resolved through `PATH` by the annotator.
pub const DEFAULT_VEP: &str = "vep";

/// Outcome of a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    Failed,
    TimedOut,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// An external program plus its argument vector.
///
/// Arguments are passed to the process as-is; nothing goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl JobCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Space-joined command line, for logs only.
impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// One input file, the output it produces, and the command that produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    input_path: PathBuf,
    output_path: PathBuf,
    command: JobCommand,
}

impl Job {
    pub fn new(input_path: PathBuf, output_path: PathBuf, command: JobCommand) -> Self {
        Self {
            input_path,
            output_path,
            command,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn command(&self) -> &JobCommand {
        &self.command
    }
}

/// Which CWAS tool a batch drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolMode {
    /// Annotation with VEP. `vep` overrides the VEP executable the annotator calls.
    Annotate { vep: PathBuf },
    Categorize,
}

impl ToolMode {
    pub fn annotate() -> Self {
        ToolMode::Annotate {
            vep: PathBuf::from(DEFAULT_VEP),
        }
    }

    /// Key of this tool in the paths file.
    pub fn config_key(&self) -> &'static str {
        match self {
            ToolMode::Annotate { .. } => "annotate",
            ToolMode::Categorize => "categorize",
        }
    }

    /// Suffix that replaces the trailing `.vcf` of an input file name.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            ToolMode::Annotate { .. } => ".annot.vcf",
            ToolMode::Categorize => ".cat_result.txt",
        }
    }
}

/// Executable and mode-specific flags shared by every job of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    executable: PathBuf,
    mode: ToolMode,
}

impl JobTemplate {
    pub fn new(executable: impl Into<PathBuf>, mode: ToolMode) -> Result<Self> {
        let executable = executable.into();
        if executable.as_os_str().is_empty() {
            return Err(DispatchError::InvalidTemplate(format!(
                "empty executable path for '{}'",
                mode.config_key()
            )));
        }
        if let ToolMode::Annotate { vep } = &mode {
            if vep.as_os_str().is_empty() {
                return Err(DispatchError::InvalidTemplate(
                    "empty VEP executable path".to_string(),
                ));
            }
        }
        Ok(Self { executable, mode })
    }

    fn command(&self, input: &Path, output: &Path) -> JobCommand {
        let cmd = JobCommand::new(&self.executable)
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output);
        match &self.mode {
            ToolMode::Annotate { vep } => cmd.arg("--vep").arg(vep),
            ToolMode::Categorize => cmd,
        }
    }
}

/// Maps input paths to jobs writing into `out_dir`.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    template: JobTemplate,
    out_dir: PathBuf,
}

impl JobBuilder {
    pub fn new(template: JobTemplate, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            template,
            out_dir: out_dir.into(),
        }
    }

    /// Output path for `input`: its base name with the trailing `.vcf` swapped
    /// for the mode's suffix, placed under `out_dir`.
    pub fn output_path(&self, input: &Path) -> Result<PathBuf> {
        let invalid = || DispatchError::InvalidInputName {
            path: input.to_path_buf(),
            expected: INPUT_EXTENSION.to_string(),
        };

        let name = input.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
        let stem = name.strip_suffix(INPUT_EXTENSION).ok_or_else(invalid)?;
        if stem.is_empty() {
            return Err(invalid());
        }

        Ok(self
            .out_dir
            .join(format!("{}{}", stem, self.template.mode.output_suffix())))
    }

    pub fn build(&self, input: &Path) -> Result<Job> {
        let output = self.output_path(input)?;
        let command = self.template.command(input, &output);
        Ok(Job::new(input.to_path_buf(), output, command))
    }

    /// Build a job per input, stopping at the first bad input name.
    pub fn build_all<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<Job>> {
        inputs.iter().map(|p| self.build(p.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate_builder(out_dir: &str) -> JobBuilder {
        let template = JobTemplate::new("/opt/cwas/annotate.sh", ToolMode::annotate()).unwrap();
        JobBuilder::new(template, out_dir)
    }

    fn categorize_builder(out_dir: &str) -> JobBuilder {
        let template = JobTemplate::new("/opt/cwas/categorize.py", ToolMode::Categorize).unwrap();
        JobBuilder::new(template, out_dir)
    }

    #[test]
    fn job_status_display() {
        assert_eq!(JobStatus::Completed.to_string(), "completed");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
        assert_eq!(JobStatus::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn command_display_joins_tokens() {
        let cmd = JobCommand::new("/bin/tool").args(["-i", "in.vcf", "-o", "out.vcf"]);
        assert_eq!(cmd.to_string(), "/bin/tool -i in.vcf -o out.vcf");
    }

    #[test]
    fn annotate_job_command() {
        let job = annotate_builder("/out").build(Path::new("/in/s1.vcf")).unwrap();

        assert_eq!(job.input_path(), Path::new("/in/s1.vcf"));
        assert_eq!(job.output_path(), Path::new("/out/s1.annot.vcf"));
        assert_eq!(job.command().program(), Path::new("/opt/cwas/annotate.sh"));
        assert_eq!(
            job.command().to_string(),
            "/opt/cwas/annotate.sh -i /in/s1.vcf -o /out/s1.annot.vcf --vep vep"
        );
    }

    #[test]
    fn annotate_job_with_vep_override() {
        let mode = ToolMode::Annotate {
            vep: PathBuf::from("/opt/vep/vep.pl"),
        };
        let template = JobTemplate::new("annotate.sh", mode).unwrap();
        let job = JobBuilder::new(template, "/out")
            .build(Path::new("s1.vcf"))
            .unwrap();

        let args: Vec<_> = job.command().get_args().iter().cloned().collect();
        assert_eq!(args[args.len() - 2], OsString::from("--vep"));
        assert_eq!(args[args.len() - 1], OsString::from("/opt/vep/vep.pl"));
    }

    #[test]
    fn categorize_job_command() {
        let job = categorize_builder("/out").build(Path::new("/in/s1.annot.vcf")).unwrap();

        assert_eq!(job.output_path(), Path::new("/out/s1.annot.cat_result.txt"));
        assert_eq!(
            job.command().to_string(),
            "/opt/cwas/categorize.py -i /in/s1.annot.vcf -o /out/s1.annot.cat_result.txt"
        );
    }

    #[test]
    fn only_trailing_suffix_is_replaced() {
        let job = annotate_builder("/out").build(Path::new("/in/x.vcf.b.vcf")).unwrap();
        assert_eq!(job.output_path(), Path::new("/out/x.vcf.b.annot.vcf"));
    }

    #[test]
    fn wrong_suffix_is_rejected() {
        let err = annotate_builder("/out").build(Path::new("/in/x.txt")).unwrap_err();
        assert!(
            matches!(err, DispatchError::InvalidInputName { ref path, .. } if path == Path::new("/in/x.txt"))
        );
    }

    #[test]
    fn bare_suffix_is_rejected() {
        let err = annotate_builder("/out").build(Path::new("/in/.vcf")).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInputName { .. }));
    }

    #[test]
    fn build_all_aborts_on_first_bad_name() {
        let inputs = ["/in/a.vcf", "/in/b.txt", "/in/c.vcf"];
        let err = annotate_builder("/out").build_all(&inputs).unwrap_err();
        assert!(err.to_string().contains("b.txt"));
    }

    #[test]
    fn build_all_preserves_order() {
        let inputs = ["/in/a.vcf", "/in/b.vcf", "/in/c.vcf"];
        let jobs = categorize_builder("/out").build_all(&inputs).unwrap();
        let outputs: Vec<_> = jobs.iter().map(|j| j.output_path().to_path_buf()).collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("/out/a.cat_result.txt"),
                PathBuf::from("/out/b.cat_result.txt"),
                PathBuf::from("/out/c.cat_result.txt"),
            ]
        );
    }

    #[test]
    fn empty_executable_is_invalid_template() {
        let err = JobTemplate::new("", ToolMode::Categorize).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTemplate(_)));

        let mode = ToolMode::Annotate { vep: PathBuf::new() };
        let err = JobTemplate::new("annotate.sh", mode).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTemplate(_)));
    }
}
