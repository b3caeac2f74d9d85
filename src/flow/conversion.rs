use super::definition::FlowDefinition;
use crate::error::FlowConversionError;

/// A trait for custom data models that can be converted into a keisan `FlowDefinition`.
///
/// This is the extension point for running flows stored in any format. By
/// implementing this trait on your own structs, you provide the translation
/// layer from your canvas or storage format into nodes and edges.
///
/// # Example
///
/// ```rust
/// use keisan::prelude::*;
/// use keisan::error::FlowConversionError;
///
/// // 1. Define your custom structs for parsing your format.
/// struct MyFormula { id: String, formula: String, target: String }
/// struct MyFlow { formulas: Vec<MyFormula> }
///
/// // 2. Implement `IntoFlow` for your top-level struct.
/// impl IntoFlow for MyFlow {
///     fn into_flow(self) -> std::result::Result<FlowDefinition, FlowConversionError> {
///         let nodes = self
///             .formulas
///             .into_iter()
///             .map(|f| {
///                 FlowNodeDefinition::new(
///                     f.id,
///                     NodeKind::Computation { expression: f.formula, result_variable: f.target },
///                 )
///             })
///             .collect();
///         Ok(FlowDefinition { nodes, edges: vec![] })
///     }
/// }
///
/// let flow = MyFlow {
///     formulas: vec![MyFormula { id: "n1".into(), formula: "1 + 1".into(), target: "two".into() }],
/// }
/// .into_flow()
/// .unwrap();
/// assert_eq!(flow.nodes.len(), 1);
/// ```
pub trait IntoFlow {
    /// Consumes the object and converts it into a runnable flow.
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError>;
}

impl IntoFlow for FlowDefinition {
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError> {
        Ok(self)
    }
}
