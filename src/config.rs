//! Configuration types for the service and its default converter.
//!
//! Everything the handler needs is collected once at startup into a
//! [`ServiceConfig`] and shared read-only behind an `Arc`. Nothing is read from
//! the environment or the process working directory while a request is
//! being handled.

use crate::allow_list::AllowedBaseSet;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable whose value is appended to the allow-list.
pub const ALLOWED_BASE_PATH_ENV: &str = "ALLOWED_BASE_PATH";

/// Default shared data root; inputs below it get a sibling `.md` file.
pub const DEFAULT_SHARED_DATA_ROOT: &str = "/app/data";

/// Default legacy input root; inputs below it are written to the legacy
/// output directory.
pub const DEFAULT_LEGACY_INPUT_ROOT: &str = "/app/input";

/// Default legacy output directory.
pub const DEFAULT_LEGACY_OUTPUT_DIR: &str = "/app/output";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8002);

/// Service-wide configuration.
///
/// Built via [`ServiceConfig::builder()`].
///
/// # Example
/// ```rust
/// use pdf2md_service::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .working_dir("/srv/pdf2md")
///     .allowed_base_path("/mnt/shared")
///     .build()
///     .unwrap();
/// assert!(config.allowed.permits(std::path::Path::new("/mnt/shared/a.pdf")));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory relative request paths are resolved against.
    pub working_dir: PathBuf,

    /// Directories a requested path must fall under.
    pub allowed: AllowedBaseSet,

    /// Inputs under this root get `<stem>.md` written next to them.
    pub shared_data_root: Option<PathBuf>,

    /// Inputs under this root get `<stem>.md` written to `legacy_output_dir`.
    pub legacy_input_root: Option<PathBuf>,

    /// Destination for outputs of legacy inputs.
    pub legacy_output_dir: PathBuf,

    /// Listen address for the HTTP server.
    pub bind_addr: SocketAddr,

    /// Options for the default PDFium converter.
    pub conversion: ConversionConfig,
}

impl ServiceConfig {
    /// Create a new builder seeded with the defaults.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            working_dir: None,
            allowed_base_path: None,
            explicit_bases: None,
            shared_data_root: Some(PathBuf::from(DEFAULT_SHARED_DATA_ROOT)),
            legacy_input_root: Some(PathBuf::from(DEFAULT_LEGACY_INPUT_ROOT)),
            legacy_output_dir: PathBuf::from(DEFAULT_LEGACY_OUTPUT_DIR),
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
            conversion: ConversionConfig::default(),
        }
    }

    /// Defaults plus `ALLOWED_BASE_PATH` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Ok(extra) = std::env::var(ALLOWED_BASE_PATH_ENV) {
            builder = builder.allowed_base_path(extra);
        }
        builder.build()
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    working_dir: Option<PathBuf>,
    allowed_base_path: Option<String>,
    explicit_bases: Option<Vec<PathBuf>>,
    shared_data_root: Option<PathBuf>,
    legacy_input_root: Option<PathBuf>,
    legacy_output_dir: PathBuf,
    bind_addr: SocketAddr,
    conversion: ConversionConfig,
}

impl ServiceConfigBuilder {
    /// Working directory; defaults to the process's current directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Extra allow-list entry, as supplied by `ALLOWED_BASE_PATH`.
    pub fn allowed_base_path(mut self, path: impl Into<String>) -> Self {
        self.allowed_base_path = Some(path.into());
        self
    }

    /// Replace the standard allow-list (working dir + mount points) entirely.
    pub fn allowed_bases<I, P>(mut self, bases: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.explicit_bases = Some(bases.into_iter().map(Into::into).collect());
        self
    }

    pub fn shared_data_root(mut self, root: Option<PathBuf>) -> Self {
        self.shared_data_root = root;
        self
    }

    pub fn legacy_input_root(mut self, root: Option<PathBuf>) -> Self {
        self.legacy_input_root = root;
        self
    }

    pub fn legacy_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.legacy_output_dir = dir.into();
        self
    }

    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn conversion(mut self, conversion: ConversionConfig) -> Self {
        self.conversion = conversion;
        self
    }

    /// Build the configuration, resolving the allow-list.
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(ConfigError::WorkingDirUnavailable)?,
        };
        if !working_dir.is_absolute() {
            return Err(ConfigError::RelativeWorkingDir { path: working_dir });
        }

        let allowed = match self.explicit_bases {
            Some(bases) => {
                let mut bases = bases;
                if let Some(extra) = self.allowed_base_path.as_deref() {
                    if !extra.is_empty() {
                        bases.push(PathBuf::from(extra));
                    }
                }
                AllowedBaseSet::new(bases, &working_dir)
            }
            None => AllowedBaseSet::standard(&working_dir, self.allowed_base_path.as_deref()),
        };

        let absolutize = |p: PathBuf| crate::allow_list::normalize(&p, &working_dir);

        Ok(ServiceConfig {
            shared_data_root: self.shared_data_root.map(absolutize),
            legacy_input_root: self.legacy_input_root.map(absolutize),
            legacy_output_dir: absolutize(self.legacy_output_dir),
            working_dir,
            allowed,
            bind_addr: self.bind_addr,
            conversion: self.conversion,
        })
    }
}

/// Options for [`crate::PdfiumConverter`].
#[derive(Debug, Clone, Default)]
pub struct ConversionConfig {
    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page separator in assembled output. Default: None.
    pub page_separator: PageSeparator,

    /// Include YAML front-matter with document metadata. Default: false.
    pub include_metadata: bool,

    /// Explicit PDFium library location (file or directory). When `None`,
    /// `PDFIUM_LIB_PATH`, the working directory and the system library are
    /// tried in that order.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.pdfium_lib_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<ConversionConfig, ConfigError> {
        if let PageSeparator::Custom(ref s) = self.config.page_separator {
            if s.trim().is_empty() {
                return Err(ConfigError::BlankPageSeparator);
            }
        }
        Ok(self.config)
    }
}

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string for the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }

    /// Parse the CLI spelling: `none`, `hr`, `comment`, anything else is custom.
    pub fn parse(s: &str) -> Self {
        match s {
            "none" => PageSeparator::None,
            "hr" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            custom => PageSeparator::Custom(custom.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn builder_defaults() {
        let config = ServiceConfig::builder()
            .working_dir("/srv/app")
            .build()
            .unwrap();
        assert_eq!(config.working_dir, PathBuf::from("/srv/app"));
        assert_eq!(
            config.shared_data_root.as_deref(),
            Some(Path::new(DEFAULT_SHARED_DATA_ROOT))
        );
        assert_eq!(
            config.legacy_input_root.as_deref(),
            Some(Path::new(DEFAULT_LEGACY_INPUT_ROOT))
        );
        assert_eq!(config.legacy_output_dir, PathBuf::from(DEFAULT_LEGACY_OUTPUT_DIR));
        assert_eq!(config.bind_addr.port(), 8002);
        assert!(config.allowed.permits(Path::new("/srv/app/x.pdf")));
        assert!(!config.allowed.permits(Path::new("/tmp/x/doc.pdf")));
    }

    #[test]
    fn allowed_base_path_extends_allow_list() {
        let config = ServiceConfig::builder()
            .working_dir("/srv/app")
            .allowed_base_path("/tmp/x/")
            .build()
            .unwrap();
        assert!(config.allowed.permits(Path::new("/tmp/x/doc.pdf")));
    }

    #[test]
    fn from_env_reads_allowed_base_path() {
        let extra = tempfile::tempdir().unwrap();
        let doc = extra.path().join("doc.pdf");

        std::env::set_var(ALLOWED_BASE_PATH_ENV, format!("{}/", extra.path().display()));
        let config = ServiceConfig::from_env();
        std::env::remove_var(ALLOWED_BASE_PATH_ENV);

        let config = config.unwrap();
        assert!(config.allowed.permits(&doc));
        assert!(config.allowed.permits(Path::new("/app/data/a.pdf")));
        assert!(config
            .allowed
            .permits(&config.working_dir.join("report.pdf")));
    }

    #[test]
    fn explicit_bases_replace_standard_set() {
        let config = ServiceConfig::builder()
            .working_dir("/srv/app")
            .allowed_bases(["/only/here"])
            .build()
            .unwrap();
        assert!(config.allowed.permits(Path::new("/only/here/a.pdf")));
        assert!(!config.allowed.permits(Path::new("/srv/app/a.pdf")));
        assert!(!config.allowed.permits(Path::new("/app/data/a.pdf")));
    }

    #[test]
    fn relative_working_dir_is_rejected() {
        let err = ServiceConfig::builder()
            .working_dir("relative")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RelativeWorkingDir { .. }), "{err:?}");
    }

    #[test]
    fn page_separator_render_and_parse() {
        assert_eq!(PageSeparator::parse("none").render(2), "\n\n");
        assert_eq!(PageSeparator::parse("hr").render(2), "\n\n---\n\n");
        assert_eq!(
            PageSeparator::parse("comment").render(3),
            "\n\n<!-- page 3 -->\n\n"
        );
        assert_eq!(
            PageSeparator::parse("* * *"),
            PageSeparator::Custom("* * *".into())
        );
    }

    #[test]
    fn blank_custom_separator_is_rejected() {
        assert!(matches!(
            ConversionConfig::builder()
                .page_separator(PageSeparator::Custom("  ".into()))
                .build(),
            Err(ConfigError::BlankPageSeparator)
        ));
    }
}
