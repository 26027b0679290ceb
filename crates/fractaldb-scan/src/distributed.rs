//! Federated scanning across nested databases.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use fractaldb_core::{AreaName, Category, Handle, QualifiedName, ScanError};

use crate::context::Context;
use crate::scanner::{
    MemberFailure, NameFilter, ScanSummary, Scanner, SubNameQuery, has_sub_names_of, sub_names_of,
};

/// One member of a federation.
#[derive(Clone)]
pub struct FederationMember {
    pub label: String,
    pub scanner: Arc<dyn Scanner>,
}

/// Scanner merging the indexes of several member scanners.
///
/// Members are kept in declaration order; lookups that need a single answer
/// take the first member that has one.
pub struct DistributedScanner {
    label: String,
    members: Vec<FederationMember>,
}

impl DistributedScanner {
    pub fn new(label: impl Into<String>, members: Vec<FederationMember>) -> Self {
        Self {
            label: label.into(),
            members,
        }
    }

    /// Federate the `category` scanners of every member of `context`.
    ///
    /// Members whose database lacks the category are left out. Returns
    /// `None` when no member supports it.
    pub fn for_category(context: &Context, category: Category) -> Option<Self> {
        let members: Vec<FederationMember> = context
            .members()
            .into_iter()
            .filter_map(|member| {
                member.database().scanner(category).map(|scanner| FederationMember {
                    label: member.label().to_string(),
                    scanner,
                })
            })
            .collect();
        if members.is_empty() {
            return None;
        }
        Some(Self::new(format!("{}/{category}*", context.label()), members))
    }

    pub fn members(&self) -> &[FederationMember] {
        &self.members
    }
}

impl Scanner for DistributedScanner {
    fn label(&self) -> &str {
        &self.label
    }

    fn rescan(&self, verbose: bool) -> Result<ScanSummary, ScanError> {
        let start = Instant::now();
        let results: Vec<(&FederationMember, Result<ScanSummary, ScanError>)> = self
            .members
            .par_iter()
            .map(|member| (member, member.scanner.rescan(verbose)))
            .collect();

        let mut summary = ScanSummary {
            label: self.label.clone(),
            ..ScanSummary::default()
        };
        let mut succeeded = 0usize;
        for (member, result) in results {
            match result {
                Ok(member_summary) => {
                    succeeded += 1;
                    summary.warnings += member_summary.warnings;
                    summary.failed_members.extend(member_summary.failed_members);
                }
                Err(e) => {
                    warn!(member = %member.label, error = %e, "member rescan failed, keeping its index");
                    summary.failed_members.push(MemberFailure {
                        label: member.label.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if succeeded == 0 && !self.members.is_empty() {
            return Err(ScanError::AllMembersFailed {
                count: self.members.len(),
            });
        }

        summary.names = self.names().len();
        summary.artifacts = self
            .members
            .iter()
            .map(|m| {
                m.scanner
                    .names()
                    .iter()
                    .map(|n| m.scanner.handles(n).len())
                    .sum::<usize>()
            })
            .sum();
        summary.elapsed = start.elapsed();

        if verbose {
            info!(
                scanner = %self.label,
                members = self.members.len(),
                failed = summary.failed_members.len(),
                names = summary.names,
                "federated rescan complete"
            );
        }
        Ok(summary)
    }

    fn names(&self) -> BTreeSet<AreaName> {
        self.members
            .iter()
            .flat_map(|m| m.scanner.names())
            .collect()
    }

    fn qualified_names(&self, name: &AreaName) -> BTreeSet<QualifiedName> {
        self.members
            .iter()
            .flat_map(|m| m.scanner.qualified_names(name))
            .collect()
    }

    fn handle(&self, name: &QualifiedName) -> Option<Arc<Handle>> {
        self.members.iter().find_map(|m| m.scanner.handle(name))
    }

    fn handles(&self, name: &AreaName) -> Vec<Arc<Handle>> {
        self.members
            .iter()
            .flat_map(|m| m.scanner.handles(name))
            .collect()
    }

    fn sub_name_query(&self) -> Option<&dyn SubNameQuery> {
        Some(self)
    }
}

impl SubNameQuery for DistributedScanner {
    fn sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> BTreeSet<AreaName> {
        self.members
            .iter()
            .flat_map(|m| sub_names_of(m.scanner.as_ref(), name, filter))
            .collect()
    }

    fn has_sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> bool {
        self.members
            .iter()
            .any(|m| has_sub_names_of(m.scanner.as_ref(), name, filter))
    }
}

/// Scanner for `category` over `context`.
///
/// Federated when the context has nested members, the root database's own
/// scanner otherwise. `None` if the root database lacks the category.
pub fn category_scanner(context: &Context, category: Category) -> Option<Arc<dyn Scanner>> {
    let direct = context.database().scanner(category)?;
    if !context.has_nested() {
        return Some(direct);
    }
    DistributedScanner::for_category(context, category)
        .map(|scanner| Arc::new(scanner) as Arc<dyn Scanner>)
}
