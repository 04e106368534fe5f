//! Seed passages and TOML corpus loading.
//!
//! A corpus file is a list of `[[documents]]` tables:
//!
//! ```toml
//! [[documents]]
//! topic = "vectores"
//! level = 1
//! keywords = ["vector", "magnitud"]
//! content = "Un vector es..."
//! ```

use serde::Deserialize;
use std::path::Path;
use vectormentor_core::error::RetrievalError;
use vectormentor_core::retrieval::RetrievedDocument;
use vectormentor_core::tutoring::Level;

#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    documents: Vec<CorpusEntry>,
}

#[derive(Debug, Deserialize)]
struct CorpusEntry {
    #[serde(default)]
    id: Option<String>,
    topic: String,
    level: u8,
    #[serde(default)]
    keywords: Vec<String>,
    content: String,
}

/// Read a TOML corpus. Entries with a level outside `1..=5` are rejected.
pub fn load_corpus(path: &Path) -> Result<Vec<RetrievedDocument>, RetrievalError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| RetrievalError::Storage(format!("{}: {e}", path.display())))?;
    parse_corpus(&raw)
}

fn parse_corpus(raw: &str) -> Result<Vec<RetrievedDocument>, RetrievalError> {
    let file: CorpusFile =
        toml::from_str(raw).map_err(|e| RetrievalError::Storage(format!("invalid corpus: {e}")))?;

    file.documents
        .into_iter()
        .map(|entry| -> Result<RetrievedDocument, RetrievalError> {
            let level = Level::try_from(entry.level).map_err(RetrievalError::Storage)?;
            Ok(RetrievedDocument {
                id: entry.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                content: entry.content.trim().to_string(),
                topic: entry.topic,
                level: level.get(),
                keywords: entry.keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                score: 0.0,
            })
        })
        .collect()
}

fn seed(id: &str, topic: &str, level: u8, keywords: &[&str], content: &str) -> RetrievedDocument {
    RetrievedDocument {
        id: id.into(),
        content: content.into(),
        topic: topic.into(),
        level,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        score: 0.0,
    }
}

/// Built-in linear-algebra passages used when no corpus file is configured.
pub fn seed_documents() -> Vec<RetrievedDocument> {
    vec![
        seed(
            "vectores_basicos",
            "vectores",
            1,
            &["vector", "vectores", "magnitud", "dirección", "componentes"],
            "VECTORES BÁSICOS: Un vector es una cantidad con magnitud y dirección. \
             En 2D se escribe como (x, y) y su magnitud es ||v|| = √(x² + y²). \
             Ejemplo: v = (3, 4) tiene magnitud √(9 + 16) = 5. \
             Dos vectores se suman componente a componente: (2, 3) + (1, 4) = (3, 7).",
        ),
        seed(
            "operaciones_vectores",
            "vectores",
            2,
            &["suma", "resta", "producto", "escalar", "operaciones"],
            "OPERACIONES CON VECTORES: suma u + v = (u₁ + v₁, u₂ + v₂); \
             resta u - v = (u₁ - v₁, u₂ - v₂); producto por escalar k·v = (k·v₁, k·v₂); \
             producto punto u·v = u₁v₁ + u₂v₂. Ejemplo: (2,3)·(4,1) = 8 + 3 = 11.",
        ),
        seed(
            "producto_punto",
            "producto_punto",
            3,
            &["producto", "punto", "escalar", "perpendicular", "ortogonal", "ángulo"],
            "PRODUCTO PUNTO: u·v = ||u|| ||v|| cos(θ), con θ el ángulo entre los vectores. \
             Si u·v = 0 los vectores son perpendiculares (ortogonales); si u·v > 0 el ángulo \
             es agudo y si u·v < 0 es obtuso. Ejemplo: (1,0)·(0,1) = 0, son perpendiculares.",
        ),
        seed(
            "matrices_basicas",
            "matrices",
            2,
            &["matriz", "matrices", "filas", "columnas", "multiplicación", "suma"],
            "MATRICES: una matriz m×n tiene m filas y n columnas. La suma A + B se hace \
             elemento a elemento y exige las mismas dimensiones. En el producto, \
             (AB)ᵢⱼ = Σₖ Aᵢₖ·Bₖⱼ. Ejemplo: [[1,2],[3,4]] × [[5,6],[7,8]] = [[19,22],[43,50]].",
        ),
        seed(
            "multiplicacion_matrices",
            "multiplicacion_matrices",
            3,
            &["producto", "multiplicación", "matrices", "compatibilidad", "columnas", "filas"],
            "MULTIPLICACIÓN DE MATRICES: A×B existe solo si el número de columnas de A es igual \
             al número de filas de B. Cada elemento c_ij es el producto punto de la fila i de A \
             por la columna j de B. No es conmutativa (A×B ≠ B×A en general), pero sí asociativa \
             y distributiva respecto a la suma.",
        ),
        seed(
            "determinantes",
            "determinantes",
            3,
            &["determinante", "det", "invertible", "singular", "sarrus"],
            "DETERMINANTES: para A = [[a, b], [c, d]], det(A) = ad - bc. Ejemplo: \
             det([[3, 1], [2, 4]]) = 12 - 2 = 10. Si det(A) = 0 la matriz es singular y no \
             tiene inversa. |det(A)| es el área del paralelogramo formado por las filas. \
             En 3×3 se usa la regla de Sarrus o la expansión por cofactores.",
        ),
        seed(
            "sistemas_lineales",
            "sistemas_lineales",
            3,
            &["sistema", "ecuaciones", "eliminación", "gaussiana", "cramer", "solución"],
            "SISTEMAS LINEALES: se escriben como Ax = b, con A la matriz de coeficientes, \
             x el vector de incógnitas y b el vector de términos independientes. Métodos: \
             eliminación gaussiana, regla de Cramer, factorización LU. Ejemplo: 2x + 3y = 7, \
             x - y = 1 da x = 2, y = 1. Un sistema puede tener solución única, infinitas o ninguna.",
        ),
        seed(
            "espacios_vectoriales",
            "espacios_vectoriales",
            4,
            &["espacio", "vectorial", "axiomas", "dimensión", "base"],
            "ESPACIOS VECTORIALES: un conjunto V con suma y producto por escalar que cumple \
             ocho axiomas (clausura, conmutatividad, asociatividad, neutro, inverso, clausura \
             escalar, distributividad y compatibilidad). Ejemplos: R², R³, los polinomios de \
             grado ≤ n y las matrices m×n.",
        ),
        seed(
            "independencia_lineal",
            "espacios_vectoriales",
            4,
            &["independencia", "lineal", "base", "combinación", "paralelos"],
            "INDEPENDENCIA LINEAL: {v₁, ..., vₙ} es linealmente independiente si \
             c₁v₁ + ... + cₙvₙ = 0 solo se cumple con todos los cᵢ = 0. En R² dos vectores son \
             independientes si no son paralelos. Un conjunto independiente que genera todo el \
             espacio es una base.",
        ),
    ]
}
