//! Pagination planning
//!
//! Decides, per binding, how many table instances an array needs and which
//! structural operations create them. With `items_per_slide = 5`:
//!
//! | items | slides | structural operations |
//! |-------|--------|-----------------------|
//! | 0     | 0      | delete the slide      |
//! | 5     | 1      | none                  |
//! | 12    | 3      | two duplicates        |
//!
//! Tables that share a slide share its structural operations: the slide is
//! duplicated for the largest plan on it and deleted only when every plan on
//! it is empty.

use std::collections::HashSet;

use deckfill_model::Operation;
use serde_json::{Map, Value};

use crate::diagnostics::{self, Diagnostic, Diagnostics};
use crate::resolver::Binding;

/// Structural plan for one binding
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationPlan<'d> {
    /// The binding being planned
    pub binding: Binding,
    /// Items to place, in order
    pub items: &'d [Value],
    /// Data rows per table instance
    pub items_per_slide: usize,
    /// Table instances required
    pub slides_needed: usize,
    /// Copies of the binding's slide left by the structural phase
    pub instances: usize,
    /// Duplicate or delete operations realizing the plan
    pub structural_ops: Vec<Operation>,
}

impl<'d> PopulationPlan<'d> {
    /// Data key of the plan
    pub fn array_key(&self) -> &str {
        &self.binding.array_key
    }

    /// Number of items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the array is empty
    ///
    /// The slide goes away with it unless another bound table shares it.
    pub fn deletes_slide(&self) -> bool {
        self.slides_needed == 0
    }

    /// Items hosted by table instance `instance`
    pub fn slice_for(&self, instance: usize) -> &'d [Value] {
        let start = instance.saturating_mul(self.items_per_slide).min(self.items.len());
        let end = start.saturating_add(self.items_per_slide).min(self.items.len());
        &self.items[start..end]
    }
}

/// Table instances needed for `item_count` items
pub fn slides_needed(item_count: usize, items_per_slide: usize) -> usize {
    item_count.div_ceil(items_per_slide.max(1))
}

/// Plan one binding against the value stored under its key
///
/// An array is paginated as is; an object is treated as a one-item array.
/// Any other value cannot fill a table and yields `None`.
pub fn plan<'d>(
    binding: &Binding,
    value: &'d Value,
    items_per_slide: usize,
) -> Option<PopulationPlan<'d>> {
    let items: &'d [Value] = match value {
        Value::Array(items) => items,
        Value::Object(_) => std::slice::from_ref(value),
        _ => return None,
    };

    let slides_needed = slides_needed(items.len(), items_per_slide);
    let structural_ops = if slides_needed == 0 {
        vec![Operation::delete(&binding.slide_id)]
    } else {
        (1..slides_needed)
            .map(|_| Operation::duplicate(&binding.slide_id))
            .collect()
    };

    Some(PopulationPlan {
        binding: binding.clone(),
        items,
        items_per_slide,
        slides_needed,
        instances: slides_needed,
        structural_ops,
    })
}

/// Plan every binding against the input data
///
/// Bindings whose key is absent (or holds a value that cannot fill a table)
/// are skipped with one diagnostic each. Only the first binding of a key is
/// planned; later ones are reported and skipped. Plans on a shared slide get
/// merged structural operations and one `DF006` diagnostic per slide.
pub fn plan_all<'d>(
    bindings: &[Binding],
    data: &'d Map<String, Value>,
    items_per_slide: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<PopulationPlan<'d>> {
    let mut planned: HashSet<&str> = HashSet::new();
    let mut plans = Vec::new();

    for binding in bindings {
        let key = binding.array_key.as_str();
        if planned.contains(key) {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "Table '{}' on slide {} is bound to '{}', which another table already uses",
                    binding.table_id,
                    binding.slide_index + 1,
                    key
                ))
                .with_code(diagnostics::DUPLICATE_BINDING)
                .with_key(key),
            );
            continue;
        }

        let Some(value) = data.get(key) else {
            diagnostics.push(
                Diagnostic::warning(format!("Array key '{}' not found in data", key))
                    .with_code(diagnostics::MISSING_ARRAY_KEY)
                    .with_key(key)
                    .with_help(format!("add an array named '{}' to the input", key)),
            );
            continue;
        };

        match plan(binding, value, items_per_slide) {
            Some(p) => {
                tracing::debug!(
                    array_key = key,
                    items = p.item_count(),
                    slides_needed = p.slides_needed,
                    "planned table pagination"
                );
                planned.insert(key);
                plans.push(p);
            }
            None => diagnostics.push(
                Diagnostic::warning(format!(
                    "Value of '{}' is not an array and cannot fill a table",
                    key
                ))
                .with_code(diagnostics::MISSING_ARRAY_KEY)
                .with_key(key),
            ),
        }
    }

    merge_shared_slides(&mut plans, diagnostics);
    plans
}

/// Give plans that share a slide one set of structural operations
///
/// The merged operations ride on the first plan of the slide; the others
/// carry none. Every plan on the slide records the resulting instance count.
fn merge_shared_slides(plans: &mut [PopulationPlan<'_>], diagnostics: &mut Diagnostics) {
    let mut by_slide: Vec<(String, Vec<usize>)> = Vec::new();
    for (index, p) in plans.iter().enumerate() {
        match by_slide.iter_mut().find(|(slide, _)| *slide == p.binding.slide_id) {
            Some((_, members)) => members.push(index),
            None => by_slide.push((p.binding.slide_id.clone(), vec![index])),
        }
    }

    for (slide_id, members) in by_slide.into_iter().filter(|(_, m)| m.len() > 1) {
        let instances = members
            .iter()
            .map(|&i| plans[i].slides_needed)
            .max()
            .unwrap_or(0);
        let ops = if instances == 0 {
            vec![Operation::delete(&slide_id)]
        } else {
            (1..instances).map(|_| Operation::duplicate(&slide_id)).collect()
        };

        let keys: Vec<&str> = members.iter().map(|&i| plans[i].array_key()).collect();
        let kept_empty = instances > 0 && members.iter().any(|&i| plans[i].deletes_slide());
        let outcome = match instances {
            0 => "it is deleted".to_string(),
            n => format!("it is kept as {} instance(s)", n),
        };
        let mut diagnostic = Diagnostic::warning(format!(
            "Slide {} hosts tables for {}; {}",
            plans[members[0]].binding.slide_index + 1,
            keys.join(", "),
            outcome
        ))
        .with_code(diagnostics::SHARED_SLIDE)
        .with_key(keys[0]);
        if kept_empty {
            diagnostic = diagnostic.with_help("empty arrays leave their tables with only a header");
        }
        diagnostics.push(diagnostic);

        for (position, &i) in members.iter().enumerate() {
            plans[i].instances = instances;
            plans[i].structural_ops = if position == 0 { ops.clone() } else { Vec::new() };
        }
    }
}

/// All structural operations of `plans`, in plan order
pub fn structural_ops(plans: &[PopulationPlan<'_>]) -> Vec<Operation> {
    plans
        .iter()
        .flat_map(|p| p.structural_ops.iter().cloned())
        .collect()
}
