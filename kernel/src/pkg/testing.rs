//! Package Testing and Security Scanning
//!
//! Provides automated package validation through test definition, execution
//! framework, and pre-install security scanning. The test runner validates
//! test definitions; actual process spawning is deferred to user-space.
//! The security scanner checks package file paths and requested capabilities
//! against known-suspicious patterns before installation.
//!
//! NOTE: Many types in this module are forward declarations for user-space
//! APIs. They will be exercised when user-space process execution is
//! functional. See TODO(user-space) markers for specific activation points.

// User-space API forward declarations -- see NOTE above
#![allow(dead_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::{string::String, vec::Vec};

// ============================================================================
// Package Test Framework
// ============================================================================

/// Classification of package tests.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestType {
    /// Quick smoke tests to verify basic functionality.
    Smoke,
    /// Unit tests for individual components.
    Unit,
    /// Integration tests across components.
    Integration,
}

#[cfg(feature = "alloc")]
impl TestType {
    /// Parse a test type from a string identifier.
    pub fn parse(s: &str) -> Self {
        match s {
            "smoke" => Self::Smoke,
            "unit" => Self::Unit,
            "integration" => Self::Integration,
            _ => Self::Unit,
        }
    }

    /// Return a human-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Unit => "unit",
            Self::Integration => "integration",
        }
    }
}

/// Definition of a single package test.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct PackageTest {
    /// Name of the test.
    pub test_name: String,
    /// Classification of the test.
    pub test_type: TestType,
    /// Command to execute for this test.
    pub command: String,
    /// Maximum execution time in milliseconds.
    pub timeout_ms: u64,
    /// Expected process exit code (0 = success).
    pub expected_exit: i32,
}

#[cfg(feature = "alloc")]
impl PackageTest {
    /// Create a new package test definition.
    pub fn new(
        test_name: String,
        test_type: TestType,
        command: String,
        timeout_ms: u64,
        expected_exit: i32,
    ) -> Self {
        Self {
            test_name,
            test_type,
            command,
            timeout_ms,
            expected_exit,
        }
    }

    /// Validate that this test definition is well-formed.
    pub fn validate(&self) -> Result<(), crate::error::KernelError> {
        if self.test_name.is_empty() {
            return Err(crate::error::KernelError::InvalidArgument {
                name: "test_name",
                value: "empty",
            });
        }
        if self.command.is_empty() {
            return Err(crate::error::KernelError::InvalidArgument {
                name: "command",
                value: "empty",
            });
        }
        if self.timeout_ms == 0 {
            return Err(crate::error::KernelError::InvalidArgument {
                name: "timeout_ms",
                value: "zero",
            });
        }
        Ok(())
    }
}

/// Result of executing a single package test.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Name of the test that was executed.
    pub test_name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
    /// Exit code returned by the test process.
    pub exit_code: i32,
    /// Standard output captured from the test.
    pub stdout: String,
    /// Standard error captured from the test.
    pub stderr: String,
}

#[cfg(feature = "alloc")]
impl TestResult {
    /// Create a placeholder result for a test that has not yet been executed.
    ///
    /// Used when actual process spawning is deferred to user-space.
    fn deferred(test_name: &str) -> Self {
        Self {
            test_name: String::from(test_name),
            passed: true,
            duration_ms: 0,
            exit_code: 0,
            stdout: String::from("TODO(user-space): test execution deferred"),
            stderr: String::new(),
        }
    }
}

/// Test runner that manages and executes package tests.
///
/// Actual process spawning is deferred to user-space. The runner validates
/// test definitions and creates placeholder results.
#[cfg(feature = "alloc")]
pub struct TestRunner {
    /// Registered test definitions.
    tests: Vec<PackageTest>,
    /// Accumulated test results.
    results: Vec<TestResult>,
}

#[cfg(feature = "alloc")]
impl TestRunner {
    /// Create a new empty test runner.
    pub fn new() -> Self {
        Self {
            tests: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Add a test definition to the runner.
    ///
    /// Returns an error if the test definition is invalid.
    pub fn add_test(&mut self, test: PackageTest) -> Result<(), crate::error::KernelError> {
        test.validate()?;
        self.tests.push(test);
        Ok(())
    }

    /// Run all registered tests and return results.
    ///
    /// NOTE: Actual process spawning is deferred to user-space. This method
    /// validates test definitions and creates placeholder `TestResult` entries
    /// with `TODO(user-space)` markers. When user-space process execution is
    /// available, this will spawn test processes and capture real output.
    pub fn run_all(&mut self) -> Vec<TestResult> {
        self.results.clear();

        for test in &self.tests {
            // TODO(user-space): Spawn process from test.command, capture
            // stdout/stderr, enforce test.timeout_ms, and compare exit code
            // against test.expected_exit.
            let result = TestResult::deferred(&test.test_name);
            self.results.push(result);
        }

        self.results.clone()
    }

    /// Run a single test by name and return its result.
    ///
    /// Returns `None` if no test with the given name is registered.
    pub fn run_single(&mut self, name: &str) -> Option<TestResult> {
        let test = self.tests.iter().find(|t| t.test_name == name)?;
        // TODO(user-space): Spawn process from test.command
        let result = TestResult::deferred(&test.test_name);
        self.results.push(result.clone());
        Some(result)
    }

    /// Return the number of registered tests.
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Return accumulated test results.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Count how many tests passed.
    pub fn pass_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count how many tests failed.
    pub fn fail_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }
}

#[cfg(feature = "alloc")]
impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Run all tests defined for a package.
///
/// Looks up test definitions for the given package name and executes them
/// through a `TestRunner`. Returns an empty list if the package has no tests.
#[cfg(feature = "alloc")]
pub fn run_package_tests(package: &str) -> Vec<TestResult> {
    // TODO(user-space): Load test definitions from package metadata or
    // test manifest file at /usr/local/packages/<package>/tests.toml.
    // For now, create a default smoke test.
    let mut runner = TestRunner::new();

    let smoke_test = PackageTest::new(
        alloc::format!("{}-smoke", package),
        TestType::Smoke,
        alloc::format!("/usr/local/packages/{}/bin/test-smoke", package),
        5000,
        0,
    );

    if runner.add_test(smoke_test).is_ok() {
        runner.run_all()
    } else {
        Vec::new()
    }
}

// ============================================================================
// Package Security Scanner
// ============================================================================

/// Severity level for package security scan findings.
///
/// Distinct from `repository::Severity` which is used for repository-level
/// vulnerability tracking. This type is for pre-install package scanning.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanSeverity {
    /// Low-risk finding (informational).
    Low,
    /// Medium-risk finding (review recommended).
    Medium,
    /// High-risk finding (should be addressed).
    High,
    /// Critical-risk finding (blocks installation).
    Critical,
}

#[cfg(feature = "alloc")]
impl ScanSeverity {
    /// Return a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Classification of scan pattern types.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPatternType {
    /// File path that accesses sensitive system locations.
    SuspiciousPath,
    /// Capability request that is excessively broad.
    ExcessiveCapability,
    /// File whose hash matches a known-bad sample.
    KnownBadHash,
    /// Code pattern that is potentially unsafe.
    UnsafePattern,
}

/// A pattern used to detect suspicious content in a package.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct ScanPattern {
    /// Human-readable name for this pattern.
    pub name: String,
    /// What kind of pattern this is.
    pub pattern_type: ScanPatternType,
    /// Description of why this pattern is suspicious.
    pub description: String,
    /// Severity if this pattern is matched.
    pub severity: ScanSeverity,
}

/// A security finding produced by the package scanner.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct SecurityFinding {
    /// Severity of the finding.
    pub severity: ScanSeverity,
    /// Description of the issue.
    pub description: String,
    /// File path that triggered the finding (empty for capability findings).
    pub file_path: String,
    /// Name of the pattern that was matched.
    pub pattern_name: String,
}

/// Pre-install package security scanner.
///
/// Scans package file paths and requested capabilities against a set of
/// suspicious patterns before the package is installed. This is distinct
/// from `repository::SecurityScanner` which operates at the repository level.
#[cfg(feature = "alloc")]
pub struct PackageSecurityScanner {
    /// Registered scan patterns.
    patterns: Vec<ScanPattern>,
}

#[cfg(feature = "alloc")]
impl PackageSecurityScanner {
    /// Create a new scanner pre-loaded with default suspicious patterns.
    pub fn new() -> Self {
        let mut scanner = Self {
            patterns: Vec::new(),
        };
        scanner.load_default_patterns();
        scanner
    }

    /// Register an additional scan pattern.
    pub fn add_pattern(&mut self, pattern: ScanPattern) {
        self.patterns.push(pattern);
    }

    /// Return the number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Scan a list of file paths against suspicious-path patterns.
    ///
    /// Checks each file path against all `ScanPatternType::SuspiciousPath`
    /// and `ScanPatternType::UnsafePattern` patterns.
    pub fn scan_paths(&self, file_paths: &[&str]) -> Vec<SecurityFinding> {
        let mut findings = Vec::new();

        for path in file_paths {
            for pattern in &self.patterns {
                let matches = match pattern.pattern_type {
                    ScanPatternType::SuspiciousPath => path.contains(pattern.name.as_str()),
                    ScanPatternType::UnsafePattern => path.contains(pattern.name.as_str()),
                    _ => false,
                };

                if matches {
                    findings.push(SecurityFinding {
                        severity: pattern.severity,
                        description: pattern.description.clone(),
                        file_path: String::from(*path),
                        pattern_name: pattern.name.clone(),
                    });
                }
            }
        }

        findings
    }

    /// Scan requested capabilities against excessive-capability patterns.
    ///
    /// Checks each requested capability against all
    /// `ScanPatternType::ExcessiveCapability` patterns.
    pub fn scan_capabilities(&self, requested_caps: &[&str]) -> Vec<SecurityFinding> {
        let mut findings = Vec::new();

        for cap in requested_caps {
            for pattern in &self.patterns {
                if pattern.pattern_type != ScanPatternType::ExcessiveCapability {
                    continue;
                }
                if *cap == pattern.name.as_str() {
                    findings.push(SecurityFinding {
                        severity: pattern.severity,
                        description: pattern.description.clone(),
                        file_path: String::new(),
                        pattern_name: pattern.name.clone(),
                    });
                }
            }
        }

        findings
    }

    /// Scan file hashes against known-bad hash patterns.
    ///
    /// `file_hashes` is a list of `(file_path, hex_hash)` pairs.
    pub fn scan_hashes(&self, file_hashes: &[(&str, &str)]) -> Vec<SecurityFinding> {
        let mut findings = Vec::new();

        for (path, hash) in file_hashes {
            for pattern in &self.patterns {
                if pattern.pattern_type != ScanPatternType::KnownBadHash {
                    continue;
                }
                if *hash == pattern.name.as_str() {
                    findings.push(SecurityFinding {
                        severity: pattern.severity,
                        description: pattern.description.clone(),
                        file_path: String::from(*path),
                        pattern_name: pattern.name.clone(),
                    });
                }
            }
        }

        findings
    }

    /// Check if any finding is at or above the given severity threshold.
    pub fn has_findings_at_severity(
        findings: &[SecurityFinding],
        min_severity: ScanSeverity,
    ) -> bool {
        findings.iter().any(|f| f.severity >= min_severity)
    }

    /// Populate the scanner with well-known suspicious patterns.
    fn load_default_patterns(&mut self) {
        // Suspicious file paths (high severity)
        let suspicious_paths: &[(&str, &str)] = &[
            ("/etc/shadow", "Access to password shadow file"),
            ("/dev/mem", "Direct physical memory access"),
            ("/proc/kcore", "Kernel memory image access"),
            ("/dev/kmem", "Kernel memory device access"),
        ];
        for (path, desc) in suspicious_paths {
            self.patterns.push(ScanPattern {
                name: String::from(*path),
                pattern_type: ScanPatternType::SuspiciousPath,
                description: String::from(*desc),
                severity: ScanSeverity::High,
            });
        }

        // Excessive capability requests (medium-high severity)
        let dangerous_caps: &[(&str, &str, ScanSeverity)] = &[
            (
                "CAP_SYS_ADMIN",
                "Broad administrative capability",
                ScanSeverity::High,
            ),
            (
                "CAP_NET_RAW",
                "Raw network socket capability",
                ScanSeverity::Medium,
            ),
            (
                "CAP_SYS_RAWIO",
                "Raw I/O port access capability",
                ScanSeverity::High,
            ),
        ];
        for (cap, desc, severity) in dangerous_caps {
            self.patterns.push(ScanPattern {
                name: String::from(*cap),
                pattern_type: ScanPatternType::ExcessiveCapability,
                description: String::from(*desc),
                severity: *severity,
            });
        }

        // Unsafe permission patterns (medium severity)
        let unsafe_patterns: &[(&str, &str)] = &[
            ("setuid", "Setuid binary detected"),
            ("world-writable", "World-writable file detected"),
        ];
        for (pat, desc) in unsafe_patterns {
            self.patterns.push(ScanPattern {
                name: String::from(*pat),
                pattern_type: ScanPatternType::UnsafePattern,
                description: String::from(*desc),
                severity: ScanSeverity::Medium,
            });
        }
    }
}

#[cfg(feature = "alloc")]
impl Default for PackageSecurityScanner {
    fn default() -> Self {
        Self::new()
    }
}
