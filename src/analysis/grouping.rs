use clap::Args;

use super::similarity::MatchConf;
use super::Screen;

/// Similarity above which two screens belong to the same group.
pub const DEFAULT_GROUPING_THRESHOLD: f64 = 0.3;

#[derive(Args, Debug)]
pub struct GroupingCli {
    /// Similarity threshold for putting two screens in the same group
    #[arg(long, default_value_t = DEFAULT_GROUPING_THRESHOLD)]
    grouping_threshold: f64,
}

impl GroupingCli {
    pub fn to_conf(&self) -> GroupingConf {
        GroupingConf::default().threshold(self.grouping_threshold)
    }
}

pub struct GroupingConf {
    threshold: f64,
}

impl Default for GroupingConf {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_GROUPING_THRESHOLD,
        }
    }
}

/// Indices into the screen list forming one similarity group. The first
/// member is the seed the others were compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    members: Vec<usize>,
}

impl Group {
    pub fn seed(&self) -> usize {
        self.members[0]
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Groups always have at least their seed.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

impl GroupingConf {
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Partitions the screens into similarity groups.
    ///
    /// Greedy single pass: the first unassigned screen seeds a group and
    /// pulls in every later unassigned screen similar enough to the seed.
    /// Members are only ever compared against their seed, so two members
    /// of one group need not be similar to each other.
    pub fn group(&self, screens: &[Screen], matcher: &MatchConf) -> Vec<Group> {
        let mut assigned = vec![false; screens.len()];
        let mut groups = Vec::new();

        for seed in 0..screens.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut members = vec![seed];

            for candidate in seed + 1..screens.len() {
                if assigned[candidate] {
                    continue;
                }
                let score = matcher.score(&screens[seed], &screens[candidate]);
                log::debug!(
                    target: "group",
                    "{} vs {}: {score:.3}",
                    screens[seed].name(),
                    screens[candidate].name()
                );
                if score > self.threshold {
                    assigned[candidate] = true;
                    members.push(candidate);
                }
            }

            log::info!(
                target: "group",
                "group seeded by {} has {} member(s)",
                screens[seed].name(),
                members.len()
            );
            groups.push(Group { members });
        }

        groups
    }
}
