//! Dense renumbering of sibling execution order.

/// One sibling's position as seen by the resequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceItem<I> {
    /// Sibling identifier.
    pub id: I,
    /// One-based position, or `None` when the sibling is unordered.
    pub ordinal: Option<u32>,
}

impl<I> SequenceItem<I> {
    /// Creates a sequence item.
    #[must_use]
    pub const fn new(id: I, ordinal: Option<u32>) -> Self {
        Self { id, ordinal }
    }
}

/// Moves `moved` to position `target` and renumbers ordered siblings 1..N.
///
/// Ordered siblings are ranked by their current ordinal, ties broken by
/// identifier. The moved item is inserted at `target - 1`, clamped to the
/// valid range, so `0` means first and anything past the end means last.
/// A `None` target removes the item from the sequence and closes the gap.
/// Unordered siblings pass through untouched. The output keeps the input
/// order; when `moved` is absent the input is returned unchanged.
#[must_use]
pub fn resequence<I>(items: &[SequenceItem<I>], moved: &I, target: Option<u32>) -> Vec<SequenceItem<I>>
where
    I: Clone + Ord,
{
    if !items.iter().any(|item| &item.id == moved) {
        return items.to_vec();
    }

    let mut ordered: Vec<(u32, &I)> = items
        .iter()
        .filter(|item| &item.id != moved)
        .filter_map(|item| item.ordinal.map(|ordinal| (ordinal, &item.id)))
        .collect();
    ordered.sort();
    let mut sequence: Vec<&I> = ordered.into_iter().map(|(_, id)| id).collect();

    if let Some(position) = target {
        let index = usize::try_from(position.saturating_sub(1))
            .unwrap_or(usize::MAX)
            .min(sequence.len());
        sequence.insert(index, moved);
    }

    items
        .iter()
        .map(|item| {
            let ordinal = if &item.id == moved && target.is_none() {
                None
            } else {
                sequence
                    .iter()
                    .position(|id| *id == &item.id)
                    .and_then(|index| u32::try_from(index).ok())
                    .map(|index| index.saturating_add(1))
                    .or(item.ordinal)
            };
            SequenceItem::new(item.id.clone(), ordinal)
        })
        .collect()
}
