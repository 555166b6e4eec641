use solcloak_core::edit::{Edit, EditSet, Span};
use solcloak_utils::errors::EditError;

#[test]
fn test_overlap_is_rejected_before_any_text() {
    let edits = [
        Edit::replace(Span::new(4, 9), "left"),
        Edit::replace(Span::new(8, 12), "right"),
    ];
    let err = EditSet::from_edits(edits).unwrap_err();
    assert_eq!(
        err,
        EditError::Overlap {
            first_start: 4,
            first_end: 9,
            second_start: 8,
            second_end: 12,
        }
    );
}

#[test]
fn test_edits_apply_in_descending_order() {
    let src = "uint256 a = b + c;";
    let mut set = EditSet::new();
    // pushed front to back; offsets stay valid because application runs back to front
    set.push(Edit::replace(Span::new(8, 9), "alpha")).unwrap();
    set.push(Edit::replace(Span::new(12, 17), "(Lib.bitwiseAdd(b, c))")).unwrap();
    set.push(Edit::insert(src.len(), " // done")).unwrap();
    assert_eq!(
        set.apply(src).unwrap(),
        "uint256 alpha = (Lib.bitwiseAdd(b, c)); // done"
    );
}

#[test]
fn test_adjacent_and_same_point_insertions() {
    let src = "ab";
    let set = EditSet::from_edits([
        Edit::replace(Span::new(0, 1), "A"),
        Edit::replace(Span::new(1, 2), "B"),
        Edit::insert(2, "1"),
        Edit::insert(2, "2"),
    ])
    .unwrap();
    assert_eq!(set.apply(src).unwrap(), "AB12");
}

#[test]
fn test_invalid_edits() {
    assert!(matches!(
        EditSet::from_edits([Edit::replace(Span::new(3, 1), "")]),
        Err(EditError::Inverted { start: 3, end: 1 })
    ));

    let set = EditSet::from_edits([Edit::insert(10, "x")]).unwrap();
    assert!(matches!(set.apply("short"), Err(EditError::OutOfBounds { .. })));

    let set = EditSet::from_edits([Edit::insert(1, "x")]).unwrap();
    assert_eq!(set.apply("é"), Err(EditError::CharBoundary(1)));
}
