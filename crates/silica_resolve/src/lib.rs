//! Constant folding and array-size resolution.
//!
//! [`resolve`] is a pure pass: it takes the input tree and configuration and
//! returns a new tree with compile-time constants folded, together with the
//! [`ArraySizeTable`] recording the length of every array it could size.
//! Folding and inference feed each other (a folded `arr.Length` can size a
//! new allocation), so the pass repeats until nothing changes.

#![warn(missing_docs)]

pub mod arrays;
pub mod error;
pub mod fold;
pub mod infer;
pub mod value;

pub use arrays::{ArrayLength, ArraySizeTable, LengthSource};
pub use error::ResolveError;

use silica_ast::{SyntaxTree, TypeIndex};
use silica_config::HardwareGenerationConfig;

/// The output of [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    /// The folded tree. Node ids of surviving nodes are unchanged.
    pub tree: SyntaxTree,
    /// Every array length that could be determined.
    pub arrays: ArraySizeTable,
}

/// Folds constants and sizes arrays.
///
/// Arrays that cannot be sized are simply absent from the table; the
/// transformer reports them when it needs their length, so unreachable code
/// never fails resolution.
pub fn resolve(
    tree: &SyntaxTree,
    config: &HardwareGenerationConfig,
) -> Result<ResolvedTree, ResolveError> {
    let mut tree = tree.clone();
    let index = TypeIndex::build(&tree)?;
    let mut arrays = ArraySizeTable::from_config(config);

    let mut round = 0;
    loop {
        round += 1;
        let folded = fold::fold_constants(&mut tree);
        let inferred = infer::infer_lengths(&tree, &index, &mut arrays)?;
        let lengths = infer::fold_array_lengths(&mut tree, &index, &arrays);
        log::debug!(
            "resolve round {round}: {folded} folds, {inferred} array lengths, {lengths} length reads"
        );
        if folded + inferred + lengths == 0 {
            break;
        }
    }

    log::debug!("resolved {} array lengths", arrays.len());
    Ok(ResolvedTree { tree, arrays })
}
