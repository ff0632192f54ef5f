use crate::utils::{log2, power};

/// Where a global heap index lands: which page, which 1-based slot inside
/// that page, and the slot's level within the page's sub-heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLocation {
    pub page: u64,
    pub slot: u64,
    pub level: u32,
}

/// Map a 1-based level-order heap index onto (page, slot, level), for pages
/// that each hold a complete sub-heap of the given height.
///
/// Global levels are grouped into bands of `height - 1`; each band adds one
/// tier of child pages beneath the pages of the previous band. Within its
/// band a node picks its page by rank among groups of `2^level` nodes, and
/// its slot is the band-local level-order position. Bands are `height - 1`
/// levels tall, not `height`, because slot 1 of every non-first page only
/// duplicates the parent page's leaf.
pub fn locate(index: u64, height: u32) -> NodeLocation {
    if index == 1 {
        // The root sits above every band; the arithmetic below would
        // underflow on global level 0.
        return NodeLocation {
            page: 1,
            slot: 1,
            level: 0,
        };
    }

    let global_level = log2(index);
    let nodes_in_global_level = 1u64 << global_level;
    let band = (global_level - 1) / (height - 1);
    let level = (global_level - 1) % (height - 1) + 1;
    let nodes_in_local_level = 1u64 << level;
    let last_layer_nodes = 1u64 << (height - 1);

    let p_partial = (index - nodes_in_global_level) / nodes_in_local_level;
    let p_full = (power(last_layer_nodes, band) - 1) / (last_layer_nodes - 1);
    let slot =
        (nodes_in_local_level - 1) + (index - nodes_in_global_level) % nodes_in_local_level + 1;

    NodeLocation {
        page: p_full + p_partial + 1,
        slot,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_special() {
        assert_eq!(
            locate(1, 5),
            NodeLocation {
                page: 1,
                slot: 1,
                level: 0
            }
        );
    }

    #[test]
    fn first_page_holds_the_first_band() {
        // within page 1 the global index and the local slot coincide
        for i in 2..=31 {
            let loc = locate(i, 5);
            assert_eq!(loc.page, 1, "index {}", i);
            assert_eq!(loc.slot, i, "index {}", i);
            assert_eq!(loc.level, log2(i), "index {}", i);
        }
    }

    #[test]
    fn second_band_fans_out_under_the_first_page() {
        assert_eq!(
            locate(32, 5),
            NodeLocation {
                page: 2,
                slot: 2,
                level: 1
            }
        );
        assert_eq!(
            locate(33, 5),
            NodeLocation {
                page: 2,
                slot: 3,
                level: 1
            }
        );
        assert_eq!(
            locate(34, 5),
            NodeLocation {
                page: 3,
                slot: 2,
                level: 1
            }
        );
        assert_eq!(
            locate(63, 5),
            NodeLocation {
                page: 17,
                slot: 3,
                level: 1
            }
        );
        // one level deeper in the same band stays on the same page
        assert_eq!(
            locate(64, 5),
            NodeLocation {
                page: 2,
                slot: 4,
                level: 2
            }
        );
    }

    #[test]
    fn height_two_band_walk() {
        assert_eq!(
            locate(4, 2),
            NodeLocation {
                page: 2,
                slot: 2,
                level: 1
            }
        );
        assert_eq!(
            locate(5, 2),
            NodeLocation {
                page: 2,
                slot: 3,
                level: 1
            }
        );
        assert_eq!(
            locate(6, 2),
            NodeLocation {
                page: 3,
                slot: 2,
                level: 1
            }
        );
        assert_eq!(
            locate(7, 2),
            NodeLocation {
                page: 3,
                slot: 3,
                level: 1
            }
        );
        assert_eq!(
            locate(10, 2),
            NodeLocation {
                page: 5,
                slot: 2,
                level: 1
            }
        );
    }

    #[test]
    fn slots_stay_inside_the_page() {
        for height in 2..=6 {
            let page_nodes = (1u64 << height) - 1;
            for i in 2..=5000u64 {
                let loc = locate(i, height);
                assert!(loc.page >= 1);
                assert!(
                    loc.slot >= 2 && loc.slot <= page_nodes,
                    "height {} index {} slot {}",
                    height,
                    i,
                    loc.slot
                );
                assert!(loc.level >= 1 && loc.level <= height - 1);
            }
        }
    }

    #[test]
    fn parent_of_a_page_first_slot_is_a_parent_page_leaf() {
        // a node at slot 2 starts a fresh page; its global parent must sit
        // in the last layer of the page one tier up
        for height in 2..=5u32 {
            let last_layer_start = 1u64 << (height - 1);
            for i in 2..=4000u64 {
                let loc = locate(i, height);
                if loc.slot == 2 && loc.page != 1 {
                    let parent = locate(i / 2, height);
                    assert!(
                        parent.slot >= last_layer_start,
                        "height {} index {}",
                        height,
                        i
                    );
                }
            }
        }
    }
}
