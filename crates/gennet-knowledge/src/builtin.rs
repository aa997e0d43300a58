//! Built-in expert knowledge table, used when no data directory is configured.

use crate::loader::extract_keywords;
use crate::record::KnowledgeRecord;

const BUILTIN_TOPICS: &[(&str, &[&str])] = &[
    (
        "networking",
        &[
            "TCP/IP protocol suite fundamentals and implementation",
            "OSI model layers and practical network troubleshooting",
            "Subnetting, VLSM, and advanced IP addressing schemes",
            "Routing protocols: OSPF, BGP, EIGRP configuration and optimization",
            "Network security best practices and perimeter defense",
            "VPN technologies: IPSec, SSL/TLS, WireGuard implementation",
            "Network troubleshooting methodologies and packet analysis",
            "Software-defined networking (SDN) and network virtualization",
        ],
    ),
    (
        "cybersecurity",
        &[
            "Firewall configuration, rules optimization, and next-gen features",
            "Intrusion detection and prevention systems (IDS/IPS) deployment",
            "Encryption standards: AES, RSA, ECC, and quantum-resistant cryptography",
            "Zero-trust security architecture and implementation strategies",
            "Security auditing, compliance frameworks (SOC2, ISO27001, NIST)",
            "Threat analysis, incident response, and digital forensics",
            "Identity and access management (IAM) best practices",
            "Security operations center (SOC) setup and SIEM integration",
        ],
    ),
    (
        "cloud_computing",
        &[
            "AWS, Azure, GCP architecture design and cost optimization",
            "Kubernetes orchestration, scaling, and production deployment",
            "Infrastructure as Code (IaC): Terraform, CloudFormation, Pulumi",
            "CI/CD pipelines with Jenkins, GitLab, GitHub Actions",
            "Microservices architecture and service mesh (Istio, Linkerd)",
        ],
    ),
];

/// Build the built-in records in declaration order.
pub fn builtin_records() -> Vec<KnowledgeRecord> {
    BUILTIN_TOPICS
        .iter()
        .flat_map(|(category, topics)| {
            topics.iter().enumerate().map(move |(i, topic)| {
                KnowledgeRecord::new(format!("{category}-{:02}", i + 1), *category, *topic)
                    .with_keywords(extract_keywords(topic))
            })
        })
        .collect()
}
