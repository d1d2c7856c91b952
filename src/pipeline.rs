use std::sync::Arc;

use log::info;

use crate::config::Config;
use crate::driver::source::DocumentSource;
use crate::driver::with_scorer;
use crate::error::{Result, VectorizerError};
use crate::model::loader::load_projection;
use crate::model::WordVectorModel;
use crate::store::{FlushReport, VectorStore};
use crate::vectorizer::corpus::Corpus;
use crate::vectorizer::idf::IdfTable;
use crate::vectorizer::scorer::DocumentScorer;

/// Load everything `config` names and build the scorer
/// IDF が設定されておらず TF-IDF 系の method がある場合は `source` から計算する
pub fn build_scorer<S>(config: &Config, source: &S) -> Result<DocumentScorer>
where
    S: DocumentSource + ?Sized,
{
    let methods = config.methods()?;

    let mut model = WordVectorModel::load(&config.model_path)?;
    if let Some(path) = &config.counts_path {
        model = model.load_counts(path)?;
    }
    if let Some(path) = &config.projection_path {
        model = model.with_projection(load_projection(path)?)?;
    }
    // 入力を読む前に projection の有無を確認する
    if let Some(m) = methods.iter().find(|m| m.needs_projection() && !model.has_projection()) {
        return Err(VectorizerError::missing(format!(
            "method {m} needs a projection, set projection_path or load a model that carries one"
        )));
    }
    let mut scorer = DocumentScorer::new(Arc::new(model));

    if methods.iter().any(|m| m.needs_idf()) {
        let idf = match &config.idf_path {
            Some(path) => IdfTable::load(path)?,
            None => {
                info!("no IDF table configured, computing it from the input");
                IdfTable::from_corpus(&Corpus::from_source(source)?)
            }
        };
        scorer = scorer.with_idf(Arc::new(idf));
    }
    for &m in &methods {
        scorer.validate(m)?;
    }
    Ok(scorer)
}

/// Score `source` with every configured method and write the store
pub fn run<S>(config: &Config, source: S) -> Result<Vec<FlushReport>>
where
    S: DocumentSource,
{
    // method 名はモデルを読む前に検査する
    config.methods()?;
    let scorer = build_scorer(config, &source)?;
    let store = VectorStore::open(&config.store_path)?;
    with_scorer(source, Arc::new(scorer), store, config.methods.as_slice(), config.parallel)?.run()
}
