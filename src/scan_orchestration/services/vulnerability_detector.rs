use crate::scan_orchestration::domain::{
    ScanDepth, ScanTarget, ScanType, Severity, Vulnerability, VulnerabilityType,
};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Maximum evidence length kept on a finding, in characters
const MAX_EVIDENCE_CHARS: usize = 120;

/// A line-oriented detection rule applied to scanned content
struct ContentRule {
    vuln_type: VulnerabilityType,
    severity: Severity,
    risk_score: u8,
    min_depth: ScanDepth,
    pattern: Regex,
    /// The rule is suppressed when this pattern matches anywhere in the content
    unless: Option<Regex>,
    title: &'static str,
    description: &'static str,
    recommendation: &'static str,
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("detection rule pattern must compile")
}

static CONTENT_RULES: LazyLock<Vec<ContentRule>> = LazyLock::new(|| {
    vec![
        ContentRule {
            vuln_type: VulnerabilityType::SqlInjection,
            severity: Severity::Critical,
            risk_score: 90,
            min_depth: ScanDepth::Standard,
            pattern: regex(
                r#"(?i)\b(select|insert|update|delete)\b[^\n]*(["'`]\s*\+\s*\w|\$\{|%s|\.format\()"#,
            ),
            unless: None,
            title: "SQL Injection",
            description: "SQL statement is built by concatenating untrusted values into the query string.",
            recommendation: "Use parameterized queries or prepared statements. Never interpolate user input into SQL.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::CommandInjection,
            severity: Severity::Critical,
            risk_score: 90,
            min_depth: ScanDepth::Standard,
            pattern: regex(
                r"\beval\s*\(|child_process|\bexecSync\s*\(|os\.system\s*\(|subprocess\.\w+\([^)]*shell\s*=\s*True",
            ),
            unless: None,
            title: "Command Injection",
            description: "Dynamic code evaluation or shell execution can run attacker-controlled commands.",
            recommendation: "Avoid eval and shell execution. Pass arguments as arrays to a fixed executable and validate input against an allow-list.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::SensitiveDataExposure,
            severity: Severity::Critical,
            risk_score: 95,
            min_depth: ScanDepth::Standard,
            pattern: regex(r"AKIA[0-9A-Z]{16}|-----BEGIN (RSA |EC |OPENSSH |DSA )?PRIVATE KEY-----"),
            unless: None,
            title: "Embedded Credential Material",
            description: "Cloud access keys or private keys are embedded in the scanned content.",
            recommendation: "Revoke the exposed credential immediately and load secrets from a secret manager at runtime.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::SensitiveDataExposure,
            severity: Severity::High,
            risk_score: 80,
            min_depth: ScanDepth::Standard,
            pattern: regex(
                r#"(?i)\b(password|passwd|secret|api[_-]?key|access[_-]?token)\b["']?\s*[:=]\s*["'][^"']{4,}["']"#,
            ),
            unless: None,
            title: "Hardcoded Secret",
            description: "A password, API key or token is hardcoded in the source.",
            recommendation: "Move secrets to environment variables or a secret manager and rotate the exposed value.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::FileInclusion,
            severity: Severity::High,
            risk_score: 85,
            min_depth: ScanDepth::Standard,
            pattern: regex(r"(?i)\b(include|require)(_once)?\s*\(?\s*\$_(GET|POST|REQUEST|COOKIE)"),
            unless: None,
            title: "File Inclusion",
            description: "A file path taken from the request is passed to include/require.",
            recommendation: "Map request values to a fixed allow-list of files. Never include paths built from user input.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::AuthBypass,
            severity: Severity::High,
            risk_score: 85,
            min_depth: ScanDepth::Standard,
            pattern: regex(r"(?i)\bis_?admin\b\s*=\s*(req|request)\.(query|params|body|args|cookies)"),
            unless: None,
            title: "Authentication Bypass",
            description: "Authorization state is read directly from client-controlled request data.",
            recommendation: "Derive roles from a verified server-side session or token. Never trust client-supplied privilege flags.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::Ssrf,
            severity: Severity::High,
            risk_score: 80,
            min_depth: ScanDepth::Standard,
            pattern: regex(
                r"(?i)\b(fetch|axios\.get|requests\.get|urlopen|http\.get)\s*\(\s*(req|request)\.(query|params|body|args)",
            ),
            unless: None,
            title: "Server-Side Request Forgery",
            description: "An outbound request is made to a URL taken from request data.",
            recommendation: "Validate destination hosts against an allow-list and block internal address ranges.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::Xxe,
            severity: Severity::High,
            risk_score: 80,
            min_depth: ScanDepth::Standard,
            pattern: regex(r"(?i)<!ENTITY|<!DOCTYPE[^>]*\["),
            unless: None,
            title: "XML External Entity",
            description: "The document declares inline DTD entities that an XML parser may resolve.",
            recommendation: "Disable DTD processing and external entity resolution in the XML parser.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::Xss,
            severity: Severity::High,
            risk_score: 75,
            min_depth: ScanDepth::Standard,
            pattern: regex(r"\.innerHTML\s*=|document\.write\s*\(|dangerouslySetInnerHTML|\bv-html\b"),
            unless: None,
            title: "Cross-Site Scripting (XSS)",
            description: "Markup is written to the DOM without escaping.",
            recommendation: "Use textContent or framework escaping, sanitize HTML with a vetted library and set a Content-Security-Policy.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::Csrf,
            severity: Severity::Medium,
            risk_score: 55,
            min_depth: ScanDepth::Standard,
            pattern: regex(r#"(?i)<form[^>]*method\s*=\s*["']?post"#),
            unless: Some(regex(r"(?i)csrf|xsrf|_token")),
            title: "Missing CSRF Protection",
            description: "A state-changing form is submitted without an anti-CSRF token.",
            recommendation: "Add a per-session CSRF token to every state-changing form and set SameSite cookies.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::SecurityMisconfiguration,
            severity: Severity::Medium,
            risk_score: 45,
            min_depth: ScanDepth::Standard,
            pattern: regex(
                r#"(?i)access-control-allow-origin["']?\s*[:,]\s*["']?\*|\bdebug["']?\s*[:=]\s*true\b"#,
            ),
            unless: None,
            title: "Security Misconfiguration",
            description: "Wildcard CORS or debug mode is enabled.",
            recommendation: "Restrict allowed origins explicitly and disable debug mode in production builds.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::SensitiveDataExposure,
            severity: Severity::Low,
            risk_score: 25,
            min_depth: ScanDepth::Comprehensive,
            pattern: regex(r"(?i)\b(md5|sha1)\s*\("),
            unless: None,
            title: "Weak Hash Algorithm",
            description: "MD5 or SHA-1 is used, which is unsuitable for passwords or integrity checks.",
            recommendation: "Use SHA-256 or better for integrity and a dedicated password hash such as Argon2 or bcrypt.",
        },
        ContentRule {
            vuln_type: VulnerabilityType::SecurityMisconfiguration,
            severity: Severity::Low,
            risk_score: 15,
            min_depth: ScanDepth::Comprehensive,
            pattern: regex(r#"(?i)(src|href|action)\s*=\s*["']http://"#),
            unless: None,
            title: "Insecure Resource Reference",
            description: "A resource is loaded over plain HTTP.",
            recommendation: "Reference every resource over HTTPS.",
        },
    ]
});

static SQL_META: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)'|--|;|/\*|\bunion\b\s+\bselect\b|\bor\b\s+\d+\s*=\s*\d+"));

/// Query parameter names that usually carry an outbound URL
const URL_PARAMS: [&str; 6] = ["url", "redirect", "callback", "dest", "next", "return_to"];

/// Query parameter names that usually carry a file path
const PATH_PARAMS: [&str; 5] = ["file", "path", "page", "include", "template"];

/// Debug switches that should never be reachable on a deployed target
const DEBUG_PARAMS: [&str; 3] = ["debug", "test", "trace"];

/// VulnerabilityDetector - rule-based static detection over a target and its content
///
/// Target-level rules inspect the URL itself and run at every depth. Content rules
/// scan line by line from `standard` depth; low-signal heuristics only run at
/// `comprehensive`. Each rule reports at most one finding, at its first matching line.
///
/// Detection is deterministic: the same target, depth and content always yield the
/// same findings in the same order (ids and timestamps aside).
#[derive(Debug, Default, Clone)]
pub struct VulnerabilityDetector;

impl VulnerabilityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Runs every rule enabled at `depth`
    ///
    /// A `file` target without content has nothing to inspect and yields no findings.
    pub fn detect(
        &self,
        target: &ScanTarget,
        depth: ScanDepth,
        content: Option<&str>,
    ) -> Vec<Vulnerability> {
        let mut findings = Vec::new();

        if let Some(url) = target.url() {
            findings.extend(self.detect_in_url(url, target.scan_type(), depth));
        }

        if let Some(content) = content {
            findings.extend(self.detect_in_content(content, depth));
        }

        findings
    }

    fn detect_in_url(
        &self,
        url: &Url,
        scan_type: ScanType,
        depth: ScanDepth,
    ) -> Vec<Vulnerability> {
        let mut findings = Vec::new();
        let location = url.as_str().to_string();

        if url.scheme() == "http" {
            findings.push(
                Vulnerability::new(
                    VulnerabilityType::SensitiveDataExposure,
                    Severity::Medium,
                    "Unencrypted Transport",
                    "The target is served over plain HTTP, so traffic can be read or modified in transit.",
                    "Serve the target over HTTPS only and enable HTTP Strict Transport Security.",
                    50,
                )
                .with_location(location.clone()),
            );
        }

        if !url.username().is_empty() || url.password().is_some() {
            findings.push(
                Vulnerability::new(
                    VulnerabilityType::SensitiveDataExposure,
                    Severity::High,
                    "Credentials in URL",
                    "The target URL embeds user credentials.",
                    "Remove credentials from URLs and authenticate with headers or tokens.",
                    80,
                )
                .with_location(url.host_str().unwrap_or_default().to_string()),
            );
        }

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
            .collect();

        if let Some((name, value)) = pairs.iter().find(|(_, v)| SQL_META.is_match(v)) {
            findings.push(
                Vulnerability::new(
                    VulnerabilityType::SqlInjection,
                    Severity::High,
                    "SQL Syntax in Query Parameter",
                    "A query parameter carries SQL metacharacters, indicating the endpoint may pass it to a database unescaped.",
                    "Use parameterized queries and validate parameter types on the server.",
                    80,
                )
                .with_location(format!("query parameter '{}'", name))
                .with_evidence(truncate_evidence(value)),
            );
        }

        if let Some((name, value)) = pairs.iter().find(|(k, v)| {
            URL_PARAMS.contains(&k.as_str()) && (v.starts_with("http://") || v.starts_with("https://"))
        }) {
            findings.push(
                Vulnerability::new(
                    VulnerabilityType::Ssrf,
                    Severity::High,
                    "URL-Valued Parameter",
                    "A parameter carries a full URL that the server may fetch or redirect to.",
                    "Validate destinations against an allow-list and block internal address ranges.",
                    75,
                )
                .with_location(format!("query parameter '{}'", name))
                .with_evidence(truncate_evidence(value)),
            );
        }

        if let Some((name, value)) = pairs
            .iter()
            .find(|(k, _)| PATH_PARAMS.contains(&k.as_str()))
        {
            findings.push(
                Vulnerability::new(
                    VulnerabilityType::FileInclusion,
                    Severity::High,
                    "Path-Valued Parameter",
                    "A parameter appears to select a server-side file.",
                    "Map parameter values to a fixed allow-list of files and reject path separators.",
                    75,
                )
                .with_location(format!("query parameter '{}'", name))
                .with_evidence(truncate_evidence(value)),
            );
        }

        if scan_type == ScanType::Api && url.path().to_lowercase().contains("/admin") {
            findings.push(
                Vulnerability::new(
                    VulnerabilityType::AuthBypass,
                    Severity::High,
                    "Exposed Administrative Endpoint",
                    "An administrative API route is publicly addressable.",
                    "Require strong authentication and role checks on administrative routes, or move them off the public surface.",
                    85,
                )
                .with_location(url.path().to_string()),
            );
        }

        if depth >= ScanDepth::Comprehensive {
            if let Some((name, _)) = pairs.iter().find(|(k, v)| {
                DEBUG_PARAMS.contains(&k.as_str()) && matches!(v.as_str(), "1" | "true" | "on")
            }) {
                findings.push(
                    Vulnerability::new(
                        VulnerabilityType::SecurityMisconfiguration,
                        Severity::Low,
                        "Debug Switch in Query",
                        "A debug flag is accepted on the public URL.",
                        "Remove debug switches from production deployments.",
                        20,
                    )
                    .with_location(format!("query parameter '{}'", name)),
                );
            }
        }

        findings
    }

    fn detect_in_content(&self, content: &str, depth: ScanDepth) -> Vec<Vulnerability> {
        CONTENT_RULES
            .iter()
            .filter(|rule| depth >= rule.min_depth)
            .filter(|rule| {
                rule.unless
                    .as_ref()
                    .map_or(true, |unless| !unless.is_match(content))
            })
            .filter_map(|rule| {
                content
                    .lines()
                    .enumerate()
                    .find(|(_, line)| rule.pattern.is_match(line))
                    .map(|(index, line)| {
                        Vulnerability::new(
                            rule.vuln_type,
                            rule.severity,
                            rule.title,
                            rule.description,
                            rule.recommendation,
                            rule.risk_score,
                        )
                        .with_location(format!("line {}", index + 1))
                        .with_evidence(truncate_evidence(line.trim()))
                    })
            })
            .collect()
    }
}

fn truncate_evidence(text: &str) -> String {
    if text.chars().count() <= MAX_EVIDENCE_CHARS {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(MAX_EVIDENCE_CHARS).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_target(raw: &str) -> ScanTarget {
        ScanTarget::parse(raw, ScanType::Url).unwrap()
    }

    fn file_target() -> ScanTarget {
        ScanTarget::parse("app.js", ScanType::File).unwrap()
    }

    fn types(findings: &[Vulnerability]) -> Vec<VulnerabilityType> {
        findings.iter().map(|v| v.vuln_type()).collect()
    }

    #[test]
    fn test_clean_https_target() {
        let detector = VulnerabilityDetector::new();
        let findings = detector.detect(
            &url_target("https://example.com/"),
            ScanDepth::Comprehensive,
            None,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_plain_http_flagged() {
        let detector = VulnerabilityDetector::new();
        let findings = detector.detect(&url_target("http://example.com/"), ScanDepth::Basic, None);
        assert_eq!(types(&findings), vec![VulnerabilityType::SensitiveDataExposure]);
        assert_eq!(findings[0].severity(), Severity::Medium);
        assert_eq!(findings[0].cwe_id(), Some("CWE-200"));
    }

    #[test]
    fn test_query_parameter_rules() {
        let detector = VulnerabilityDetector::new();
        let findings = detector.detect(
            &url_target(
                "https://example.com/view?id=1%27%20OR%201=1&redirect=https://evil.example&page=about",
            ),
            ScanDepth::Basic,
            None,
        );
        assert_eq!(
            types(&findings),
            vec![
                VulnerabilityType::SqlInjection,
                VulnerabilityType::Ssrf,
                VulnerabilityType::FileInclusion,
            ]
        );
        assert_eq!(findings[0].location(), Some("query parameter 'id'"));
    }

    #[test]
    fn test_admin_api_endpoint() {
        let detector = VulnerabilityDetector::new();
        let target = ScanTarget::parse("https://example.com/api/admin/users", ScanType::Api).unwrap();
        let findings = detector.detect(&target, ScanDepth::Basic, None);
        assert_eq!(types(&findings), vec![VulnerabilityType::AuthBypass]);
    }

    #[test]
    fn test_file_without_content_is_empty() {
        let detector = VulnerabilityDetector::new();
        assert!(detector
            .detect(&file_target(), ScanDepth::Comprehensive, None)
            .is_empty());
    }

    #[test]
    fn test_content_rules_report_line_and_evidence() {
        let content = "const a = 1;\nconst q = \"SELECT * FROM users WHERE id = \" + userId;\n";
        let detector = VulnerabilityDetector::new();
        let findings = detector.detect(&file_target(), ScanDepth::Standard, Some(content));
        assert_eq!(types(&findings), vec![VulnerabilityType::SqlInjection]);
        assert_eq!(findings[0].location(), Some("line 2"));
        assert!(findings[0].evidence().unwrap().starts_with("const q"));
        assert_eq!(findings[0].severity(), Severity::Critical);
    }

    #[test]
    fn test_content_rules_skipped_at_basic_depth() {
        let content = "el.innerHTML = userInput;";
        let detector = VulnerabilityDetector::new();
        assert!(detector
            .detect(&file_target(), ScanDepth::Basic, Some(content))
            .is_empty());
        assert_eq!(
            types(&detector.detect(&file_target(), ScanDepth::Standard, Some(content))),
            vec![VulnerabilityType::Xss]
        );
    }

    #[test]
    fn test_comprehensive_only_rules() {
        let content = "const digest = md5(password);";
        let detector = VulnerabilityDetector::new();
        assert!(detector
            .detect(&file_target(), ScanDepth::Standard, Some(content))
            .is_empty());
        let findings = detector.detect(&file_target(), ScanDepth::Comprehensive, Some(content));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Low);
    }

    #[test]
    fn test_csrf_suppressed_by_token() {
        let detector = VulnerabilityDetector::new();
        let unprotected = "<form method=\"post\" action=\"/transfer\">";
        let protected = "<form method=\"post\">\n<input type=\"hidden\" name=\"csrf_token\">";

        assert_eq!(
            types(&detector.detect(&file_target(), ScanDepth::Standard, Some(unprotected))),
            vec![VulnerabilityType::Csrf]
        );
        assert!(detector
            .detect(&file_target(), ScanDepth::Standard, Some(protected))
            .is_empty());
    }

    #[test]
    fn test_one_finding_per_rule() {
        let content = "eval(a);\neval(b);\neval(c);";
        let detector = VulnerabilityDetector::new();
        let findings = detector.detect(&file_target(), ScanDepth::Standard, Some(content));
        assert_eq!(types(&findings), vec![VulnerabilityType::CommandInjection]);
        assert_eq!(findings[0].location(), Some("line 1"));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let content = "password = \"hunter22\"\ndocument.write(x)\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\">";
        let target = url_target("http://example.com/?file=../../etc/passwd");
        let detector = VulnerabilityDetector::new();

        let strip = |findings: Vec<Vulnerability>| -> Vec<(VulnerabilityType, Severity, String, Option<String>, u8)> {
            findings
                .into_iter()
                .map(|v| {
                    (
                        v.vuln_type(),
                        v.severity(),
                        v.title().to_string(),
                        v.location().map(str::to_string),
                        v.risk_score(),
                    )
                })
                .collect()
        };

        let first = strip(detector.detect(&target, ScanDepth::Comprehensive, Some(content)));
        let second = strip(detector.detect(&target, ScanDepth::Comprehensive, Some(content)));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_scores_follow_severity_bands() {
        let content = [
            "q = \"DELETE FROM t WHERE id=\" + id",
            "api_key: \"abcd1234\"",
            "el.innerHTML = x",
            "<form method=post>",
            "debug = true",
            "sha1(data)",
        ]
        .join("\n");
        let detector = VulnerabilityDetector::new();
        for finding in detector.detect(&file_target(), ScanDepth::Comprehensive, Some(&content)) {
            let score = finding.risk_score();
            let in_band = match finding.severity() {
                Severity::Critical => score >= 90,
                Severity::High => (75..=85).contains(&score),
                Severity::Medium => (40..=60).contains(&score),
                Severity::Low => (10..=30).contains(&score),
            };
            assert!(in_band, "{} scored {}", finding.title(), score);
        }
    }

    #[test]
    fn test_truncate_evidence() {
        let long = "x".repeat(300);
        let truncated = truncate_evidence(&long);
        assert_eq!(truncated.chars().count(), MAX_EVIDENCE_CHARS + 3);
        assert_eq!(truncate_evidence("short"), "short");
    }
}
