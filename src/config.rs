//! Run configuration, read from TOML.
//!
//! ```toml
//! model_path = "models/w2v.bin.txt"
//! methods = ["unique", "simple", "tf_idf"]
//! store_path = "results/document_scores.store"
//! parallel = true
//! # optional
//! counts_path = "models/vocab.txt"
//! idf_path = "results/idf.tsv"
//! projection_path = "models/ksvd_gamma.txt"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};
use crate::vectorizer::weighting::Method;

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// word2vec text model or `.cbor` model
    pub model_path: PathBuf,
    /// `token count` file applied to the model
    #[serde(default)]
    pub counts_path: Option<PathBuf>,
    /// precomputed IDF table; derived from the input when absent
    #[serde(default)]
    pub idf_path: Option<PathBuf>,
    /// projection basis for the `projected` method
    #[serde(default)]
    pub projection_path: Option<PathBuf>,
    /// method names, run in this order
    pub methods: Vec<String>,
    pub store_path: PathBuf,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| VectorizerError::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        // 相対パスは設定ファイルの場所から解決する
        Ok(match path.parent() {
            Some(base) if !base.as_os_str().is_empty() => config.resolve_paths(base),
            _ => config,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| VectorizerError::config(e.to_string()))
    }

    /// Join every relative path onto `base`
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.model_path);
        join(&mut self.store_path);
        for p in [&mut self.counts_path, &mut self.idf_path, &mut self.projection_path]
            .into_iter()
            .flatten()
        {
            join(p);
        }
        self
    }

    /// Parse the method list
    ///
    /// # Errors
    /// * `UnsupportedMethod` - unknown name
    /// * `Config` - empty list or a method listed twice
    pub fn methods(&self) -> Result<Vec<Method>> {
        if self.methods.is_empty() {
            return Err(VectorizerError::config("no methods configured"));
        }
        let methods = Method::parse_all(&self.methods)?;
        for (i, m) in methods.iter().enumerate() {
            if methods[..i].contains(m) {
                return Err(VectorizerError::config(format!("method {m} is listed twice")));
            }
        }
        Ok(methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
        model_path = "models/w2v.txt"
        methods = ["unique", "TF_IDF"]
        store_path = "out/scores.store"
        idf_path = "/data/idf.tsv"
    "#;

    #[test]
    fn parses_with_defaults() {
        let config = Config::from_toml_str(TOML).unwrap();
        assert!(config.parallel);
        assert_eq!(config.counts_path, None);
        assert_eq!(config.methods().unwrap(), vec![Method::Unique, Method::TfIdf]);
    }

    #[test]
    fn relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, TOML).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.model_path, dir.path().join("models/w2v.txt"));
        assert_eq!(config.store_path, dir.path().join("out/scores.store"));
        assert_eq!(config.idf_path, Some(PathBuf::from("/data/idf.tsv")));
    }

    #[test]
    fn bad_methods() {
        let mut config = Config::from_toml_str(TOML).unwrap();
        config.methods = vec!["simple".into(), "lda".into()];
        assert!(matches!(config.methods(), Err(VectorizerError::UnsupportedMethod(m)) if m == "lda"));
        config.methods = vec!["simple".into(), "simple".into()];
        assert!(matches!(config.methods(), Err(VectorizerError::Config(_))));
        config.methods.clear();
        assert!(matches!(config.methods(), Err(VectorizerError::Config(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = format!("{TOML}\nf_db = \"x\"\n");
        assert!(matches!(Config::from_toml_str(&text), Err(VectorizerError::Config(_))));
    }
}
