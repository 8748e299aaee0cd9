use overlayer::{ExportGroup, ResolveError, SourceLayer, resolve_document};

/// Builds a host layer list from labels given in top-to-bottom declaration
/// order, i.e. the order the engine indexes them in. Hosts enumerate bottom to
/// top, so the list is reversed here.
fn document(labels: &[&str]) -> Vec<SourceLayer> {
	labels
		.iter()
		.enumerate()
		.rev()
		.map(|(index, label)| SourceLayer::new(format!("layer{index}"), *label, None))
		.collect()
}

fn groups(labels: &[&str]) -> Vec<ExportGroup> {
	resolve_document(&document(labels)).expect("resolution failed").groups
}

fn group(labels: &[&str], name: &str) -> Vec<usize> {
	groups(labels)
		.into_iter()
		.find(|group| group.name == name)
		.unwrap_or_else(|| panic!("no group named {name:?}"))
		.indices
}

#[test]
fn untagged_layers_contribute_nothing_of_their_own() {
	let groups = groups(&["Plain", "Also plain", "Still plain"]);
	assert!(groups.is_empty());
}

#[test]
fn untagged_layers_are_swept_in_by_ranges_and_appear_by_index() {
	assert_eq!(group(&["[0/2]Scene", "Filler", "More filler"], "Scene"), vec![0, 1, 2]);
}

#[test]
fn worked_example_scene_with_persistent_background() {
	// Document of 4 layers; `0/2` resolves to 0..2 and the persistent layer 3 joins.
	let groups = groups(&["[0/2]Scene", "Two", "Three", "[p]Background"]);
	assert_eq!(groups, vec![ExportGroup {
		name: "Scene".to_string(),
		indices: vec![0, 1, 2, 3],
	}]);
}

#[test]
fn worked_example_relative_frame_with_noop_exclusion() {
	// Layer at index 2 of 5: `-1` resolves to 1, excluding `@0` is a no-op.
	assert_eq!(group(&["Top", "One", "[-1,!@0]Mid", "Three", "Four"], "Mid"), vec![1]);
}

#[test]
fn persistent_layers_join_every_other_group() {
	let groups = groups(&["[0]A", "[1]B", "[p]Keep", "[@0/@1]C"]);
	assert_eq!(groups.len(), 3);
	for group in &groups {
		assert!(group.indices.contains(&2), "group {:?} is missing the persistent layer", group.name);
	}
}

#[test]
fn persistent_layer_without_frames_forms_no_group() {
	let groups = groups(&["[p]Background", "Plain"]);
	assert!(groups.is_empty());
}

#[test]
fn persistent_layer_joins_its_own_group_only_via_its_frames() {
	// The persistent layer at index 0 owns a frame token selecting index 1 only.
	assert_eq!(group(&["[p,1]Notes", "[0/0]Title"], "Notes"), vec![1]);
	// Other groups still receive it: Title selects itself and gains the persistent layer.
	assert_eq!(group(&["[p,1]Notes", "[0/0]Title"], "Title"), vec![0, 1]);
}

#[test]
fn skip_layers_never_appear_anywhere() {
	// Layer 1 is swept by the range and tagged persistent, but skip wins.
	let groups = groups(&["[0/2]Scene", "[s,p]Guides", "Three"]);
	assert_eq!(groups, vec![ExportGroup {
		name: "Scene".to_string(),
		indices: vec![0, 2],
	}]);
}

#[test]
fn skip_layers_form_no_group_and_their_selectors_go_unresolved() {
	// `@99` would be out of range, but a skip layer's selectors are never resolved.
	let groups = groups(&["[s,@99]Scratch", "[0]Only"]);
	assert_eq!(groups.len(), 1);
	assert_eq!(groups[0].name, "Only");
}

#[test]
fn exclusion_removes_direct_and_persistent_members_alike() {
	// `!1` removes a range member; `!@-1` removes the persistent layer.
	assert_eq!(group(&["[0/2,!1]Scene", "Two", "Three", "[p]Background"], "Scene"), vec![0, 2, 3]);
	assert_eq!(group(&["[0/2,!@-1]Scene", "Two", "Three", "[p]Background"], "Scene"), vec![0, 1, 2]);
}

#[test]
fn excluding_every_member_leaves_no_group() {
	let groups = groups(&["[0,!0]Empty", "Other"]);
	assert!(groups.is_empty());
}

#[test]
fn range_order_does_not_matter() {
	let forward = group(&["Top", "One", "[3/-2]Mid", "Three", "Four", "Five"], "Mid");
	let backward = group(&["Top", "One", "[-2/3]Mid", "Three", "Four", "Five"], "Mid");
	assert_eq!(forward, backward);
	assert_eq!(forward, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn open_ranges_cover_the_document() {
	assert_eq!(group(&["[/]All", "Two", "Three"], "All"), vec![0, 1, 2]);
	assert_eq!(group(&["[/1]UpTo", "Two", "Three"], "UpTo"), vec![0, 1]);
	assert_eq!(group(&["One", "[0/]From", "Three"], "From"), vec![1, 2]);
}

#[test]
fn boundary_indices_resolve_cleanly() {
	assert_eq!(group(&["[@0]First", "Two", "Three"], "First"), vec![0]);
	assert_eq!(group(&["[@-1]Last", "Two", "Three"], "Last"), vec![2]);
	assert_eq!(group(&["[@2]AlsoLast", "Two", "Three"], "AlsoLast"), vec![2]);
}

#[test]
fn colliding_names_get_numeric_suffixes() {
	let groups = groups(&["[@0]Scene", "[@0]Scene", "[@0]Scene"]);
	assert_eq!(groups.iter().map(|group| group.name.as_str()).collect::<Vec<_>>(), vec!["Scene", "Scene_0", "Scene_1"]);
}

#[test]
fn groups_come_out_in_declaration_order() {
	let groups = groups(&["[0]Zulu", "[0]Alpha", "[0]Mike"]);
	assert_eq!(groups.iter().map(|group| group.name.as_str()).collect::<Vec<_>>(), vec!["Zulu", "Alpha", "Mike"]);
}

#[test]
fn out_of_range_token_aborts_the_whole_run() {
	let result = resolve_document(&document(&["[@10]Broken", "[0]Fine", "Three", "Four", "Five"]));
	match result {
		Err(ResolveError::FrameOutOfRange { label, token, index, layer_count }) => {
			assert_eq!(label, "Broken");
			assert_eq!(token, "@10");
			assert_eq!(index, 10);
			assert_eq!(layer_count, 5);
		}
		other => panic!("expected FrameOutOfRange, got {other:?}"),
	}
}

#[test]
fn out_of_range_exclusion_also_aborts() {
	let result = resolve_document(&document(&["[0,!@7]Broken", "Two"]));
	assert!(matches!(result, Err(ResolveError::FrameOutOfRange { .. })));
}

#[test]
fn selection_tokens_abort_with_a_capability_gap() {
	let result = resolve_document(&document(&["[#key]Marked", "[*key]Selector"]));
	match result {
		Err(ResolveError::SelectionUnsupported { label, token }) => {
			assert_eq!(label, "Selector");
			assert_eq!(token, "*key");
		}
		other => panic!("expected SelectionUnsupported, got {other:?}"),
	}
}

#[test]
fn selection_tokens_abort_even_on_layers_with_no_frames() {
	assert!(matches!(
		resolve_document(&document(&["[0]Fine", "[*key]Selector"])),
		Err(ResolveError::SelectionUnsupported { .. })
	));
}

#[test]
fn mark_tokens_parse_and_resolve_without_effect() {
	assert_eq!(group(&["[#key,0]Marked", "Two"], "Marked"), vec![0]);
}

#[test]
fn resolution_is_deterministic_across_repeated_runs() {
	let source = document(&["[0/2]Scene", "[s]Guides", "[p]Background", "[-1,!@0]Inset"]);
	let first = resolve_document(&source).unwrap();
	let second = resolve_document(&source).unwrap();
	assert_eq!(first, second);
}
