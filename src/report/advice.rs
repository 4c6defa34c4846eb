/// Fallback recommendation text for failing checks that carry none of their own.
///
/// Rules are tried in order; the first whose category matches and whose
/// predicate accepts the check name wins. A category-level default applies
/// when a known category has no matching rule, and a global default covers
/// categories the table has never heard of.
pub struct RuleTable {
    rules: Vec<Rule>,
    category_defaults: Vec<(String, String)>,
    default: String,
}

pub struct Rule {
    pub category: String,
    pub matches: Box<dyn Fn(&str) -> bool + Send + Sync>,
    pub text: String,
}

impl Rule {
    pub fn new(
        category: &str,
        matches: impl Fn(&str) -> bool + Send + Sync + 'static,
        text: &str,
    ) -> Self {
        Self {
            category: category.to_string(),
            matches: Box::new(matches),
            text: text.to_string(),
        }
    }

    fn contains(category: &str, needle: &'static str, text: &str) -> Self {
        Self::new(category, move |name| name.contains(needle), text)
    }
}

const UNMATCHED_CHECK: &str =
    "Implement best practices for this check to improve your cluster reliability and efficiency.";
const UNKNOWN_CATEGORY: &str = "Review and implement best practices for this category.";

impl RuleTable {
    pub fn new(default: &str) -> Self {
        Self {
            rules: Vec::new(),
            category_defaults: Vec::new(),
            default: default.to_string(),
        }
    }

    pub fn push(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Text used for a known category when none of its rules match.
    pub fn category_default(&mut self, category: &str, text: &str) -> &mut Self {
        self.category_defaults
            .push((category.to_string(), text.to_string()));
        self
    }

    pub fn resolve(&self, category: &str, check_name: &str) -> &str {
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| r.category == category && (r.matches)(check_name))
        {
            return &rule.text;
        }
        self.category_defaults
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, text)| text.as_str())
            .unwrap_or(&self.default)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        let mut table = RuleTable::new(UNKNOWN_CATEGORY);
        table
            .push(Rule::contains(
                "resiliency",
                "Multi-zone",
                "Deploy applications across multiple availability zones to improve fault tolerance.",
            ))
            .push(Rule::contains(
                "resiliency",
                "Health checks",
                "Implement liveness, readiness, and startup probes for all workloads.",
            ))
            .push(Rule::contains(
                "resiliency",
                "Graceful termination",
                "Configure preStop hooks and appropriate terminationGracePeriodSeconds.",
            ))
            .push(Rule::contains(
                "workload",
                "Resource requests",
                "Define CPU and memory requests for all containers based on actual usage patterns.",
            ))
            .push(Rule::contains(
                "workload",
                "Resource limits",
                "Set memory limits equal to requests to ensure guaranteed QoS class. Consider using a LimitRange.",
            ))
            .push(Rule::contains(
                "pdb",
                "PDB coverage",
                "Implement PDBs for all stateful applications and critical workloads.",
            ))
            .push(Rule::contains(
                "pdb",
                "PDB configuration",
                "Review PDB settings to ensure they don't block node draining. Use maxUnavailable rather than minAvailable where appropriate.",
            ))
            .push(Rule::contains(
                "topology",
                "Topology constraints",
                "Implement topology spread constraints for even pod distribution across failure domains.",
            ))
            .push(Rule::new(
                "topology",
                |name| name.contains("Pod anti-affinity") && name.contains("Required"),
                "Configure required pod anti-affinity for critical stateful workloads with low replica counts (2-3).",
            ))
            .push(Rule::new(
                "topology",
                |name| name.contains("Pod anti-affinity") && name.contains("Preferred"),
                "Use preferred pod anti-affinity for non-critical workloads to balance distribution while allowing scheduling flexibility.",
            ))
            .push(Rule::contains(
                "topology",
                "Pod anti-affinity",
                "Configure pod anti-affinity for workloads to ensure proper distribution across nodes.",
            ))
            .push(Rule::contains(
                "security",
                "Network policies",
                "Implement default deny network policies and explicitly allow required traffic.",
            ))
            .push(Rule::contains(
                "security",
                "Security context",
                "Configure security contexts to run containers as non-root with appropriate capabilities.",
            ))
            .push(Rule::contains(
                "network",
                "Service Topology",
                "Implement topologyKeys in Service definitions to optimize traffic routing.",
            ))
            .push(Rule::contains(
                "secrets",
                "Secret management",
                "Use external secrets management solutions (e.g., Vault, cloud provider solutions).",
            ))
            .push(Rule::new(
                "observability",
                |_| true,
                "Enhance observability by implementing comprehensive metrics, logging, and tracing.",
            ));
        for category in [
            "resiliency",
            "workload",
            "pdb",
            "topology",
            "security",
            "network",
            "secrets",
        ] {
            table.category_default(category, UNMATCHED_CHECK);
        }
        table
    }
}

/// One-sentence guidance printed under each section heading.
pub fn category_summary(category: &str) -> &'static str {
    match category {
        "resiliency" => {
            "Ensure applications are deployed across multiple zones with proper health checks and graceful termination to handle disruptions."
        }
        "workload" => {
            "Define appropriate resource requests and limits for all containers based on actual usage patterns."
        }
        "pdb" => "Implement Pod Disruption Budgets for all stateful applications and critical workloads.",
        "topology" => {
            "Use topology spread constraints and appropriate pod anti-affinity (required for critical workloads, preferred for others) for even distribution of pods across failure domains."
        }
        "security" => {
            "Implement network policies, run containers as non-root, and scan images for vulnerabilities."
        }
        "network" => {
            "Configure proper network topologies and policies to ensure secure and optimized communication."
        }
        "secrets" => "Use external secrets management solutions and ensure proper RBAC controls.",
        "observability" => {
            "Implement comprehensive metrics, logging, and tracing for better visibility into cluster operations."
        }
        _ => "Follow best practices for this category to improve cluster stability and security.",
    }
}
