use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};
use crate::vectorizer::idf::IdfTable;
use crate::vectorizer::token::TokenFrequency;

/// Document scoring method
/// トークンの重み付けと、どのベクトルを引くかを決める
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    /// 1.0 per distinct token
    Unique,
    /// raw in-document count
    Simple,
    /// IDF × in-document count
    TfIdf,
    /// TF-IDF weights over the injected projection basis
    Projected,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Unique, Method::Simple, Method::TfIdf, Method::Projected];

    /// Name used for the store dataset
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Unique => "unique",
            Method::Simple => "simple",
            Method::TfIdf => "tf_idf",
            Method::Projected => "projected",
        }
    }

    #[inline]
    pub fn needs_idf(&self) -> bool {
        matches!(self, Method::TfIdf | Method::Projected)
    }

    #[inline]
    pub fn needs_projection(&self) -> bool {
        matches!(self, Method::Projected)
    }

    /// Parse a list of method names, keeping the order
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Method>> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }

    /// token -> weight
    /// `freq` の distinct token ごとに重みを返す (出現順)
    /// IDF テーブルに無い token の IDF は 0.0
    ///
    /// # Arguments
    /// * `freq` - ドキュメント内の出現回数
    /// * `idf` - TF-IDF 系で必要な IDF テーブル
    pub fn weights<'a>(
        &self,
        freq: &'a TokenFrequency,
        idf: Option<&IdfTable>,
    ) -> Result<IndexMap<&'a str, f64>> {
        let weights: IndexMap<&'a str, f64> = match self {
            Method::Unique => freq.iter().map(|(t, _)| (t, 1.0)).collect(),
            Method::Simple => freq.iter().map(|(t, c)| (t, c as f64)).collect(),
            Method::TfIdf | Method::Projected => {
                let idf = idf.ok_or_else(|| {
                    VectorizerError::missing(format!("method {self} needs an IDF table"))
                })?;
                freq.iter()
                    .map(|(t, c)| (t, idf.get(t).unwrap_or(0.0) * c as f64))
                    .collect()
            }
        };
        Ok(weights)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Method {
    type Err = VectorizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unique" => Ok(Method::Unique),
            "simple" => Ok(Method::Simple),
            "tf_idf" | "TF_IDF" => Ok(Method::TfIdf),
            "projected" | "kSVD" => Ok(Method::Projected),
            other => Err(VectorizerError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = VectorizerError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(text: &str) -> TokenFrequency {
        TokenFrequency::from_text(text, |_| true)
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("unique".parse::<Method>().unwrap(), Method::Unique);
        assert_eq!("TF_IDF".parse::<Method>().unwrap(), Method::TfIdf);
        assert_eq!("kSVD".parse::<Method>().unwrap(), Method::Projected);
        for m in Method::ALL {
            assert_eq!(m.as_str().parse::<Method>().unwrap(), m);
        }
        assert!(matches!(
            "bm25".parse::<Method>(),
            Err(VectorizerError::UnsupportedMethod(name)) if name == "bm25"
        ));
        assert!(Method::parse_all(&["simple", "nope"]).is_err());
    }

    #[test]
    fn unique_collapses_duplicates() {
        let f = freq("a a a b");
        let w = Method::Unique.weights(&f, None).unwrap();
        assert_eq!(w.into_iter().collect::<Vec<_>>(), vec![("a", 1.0), ("b", 1.0)]);
    }

    #[test]
    fn simple_uses_counts() {
        let f = freq("a a b");
        let w = Method::Simple.weights(&f, None).unwrap();
        assert_eq!(w["a"], 2.0);
        assert_eq!(w["b"], 1.0);
    }

    #[test]
    fn tf_idf_scales_counts() {
        let f = freq("a a b c");
        let idf = IdfTable::from_pairs(vec![("a", 0.5), ("b", 3.0)]).unwrap();
        let w = Method::TfIdf.weights(&f, Some(&idf)).unwrap();
        assert_eq!(w["a"], 1.0);
        assert_eq!(w["b"], 3.0);
        assert_eq!(w["c"], 0.0);
        assert_eq!(Method::Projected.weights(&f, Some(&idf)).unwrap(), w);
    }

    #[test]
    fn tf_idf_without_table_fails() {
        let f = freq("a");
        assert!(matches!(
            Method::TfIdf.weights(&f, None),
            Err(VectorizerError::MissingResource(_))
        ));
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&vec![Method::TfIdf, Method::Unique]).unwrap();
        assert_eq!(json, r#"["tf_idf","unique"]"#);
        assert!(serde_json::from_str::<Method>(r#""lsa""#).is_err());
    }
}
