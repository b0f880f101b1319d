//! Rendering a [`GlueManifest`] to artifact text.

use std::fmt::Write;

use serde::Serialize;

use crate::core::Platform;
use crate::generator::{GlueEntry, GlueManifest, OutputFormat, FORMAT_VERSION};

/// Marker carried by every generated artifact.
pub const GENERATED_MARKER: &str = "@generated by autolink. Do not edit.";

/// Default package for the generated Kotlin source.
pub const DEFAULT_KOTLIN_PACKAGE: &str = "expo.modules";

/// Format-specific rendering settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub kotlin_package: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            kotlin_package: DEFAULT_KOTLIN_PACKAGE.to_string(),
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(rename = "@generated")]
    generated: &'a str,
    version: u32,
    target: &'a str,
    fingerprint: &'a str,
    modules: &'a [GlueEntry],
}

impl GlueManifest {
    /// Render the manifest in `format`.
    pub fn render(&self, format: OutputFormat, options: &RenderOptions) -> String {
        match format {
            OutputFormat::Json => self.render_json(),
            OutputFormat::Kotlin => self.render_kotlin(&options.kotlin_package),
            OutputFormat::Swift => self.render_swift(),
        }
    }

    fn render_json(&self) -> String {
        let document = JsonDocument {
            generated: GENERATED_MARKER,
            version: FORMAT_VERSION,
            target: self.target(),
            fingerprint: self.fingerprint(),
            modules: self.entries(),
        };
        // Plain data with string keys always serializes.
        let mut out = serde_json::to_string_pretty(&document).unwrap_or_default();
        out.push('\n');
        out
    }

    fn render_kotlin(&self, package: &str) -> String {
        let mut out = String::new();
        self.header(&mut out, "//");
        let _ = writeln!(out, "package {}", package);
        out.push('\n');
        out.push_str("object ExpoModulesPackageList {\n");
        out.push_str("  @JvmStatic\n");
        out.push_str("  val packageList: List<Class<*>> = listOf(\n");
        for entry in self.for_platform(Platform::Android) {
            let _ = writeln!(out, "    // {}", describe(entry));
            for class in &entry.classes {
                let _ = writeln!(out, "    {}::class.java,", class);
            }
        }
        out.push_str("  )\n");
        out.push_str("}\n");
        out
    }

    fn render_swift(&self) -> String {
        let mut out = String::new();
        self.header(&mut out, "//");
        out.push_str("import ExpoModulesCore\n");
        out.push('\n');
        out.push_str("@objc(ExpoModulesProvider)\n");
        out.push_str("public class ExpoModulesProvider: ModulesProvider {\n");
        out.push_str("  public override func getModuleClasses() -> [AnyModule.Type] {\n");
        out.push_str("    return [\n");
        for entry in self.for_platform(Platform::Ios) {
            let _ = write!(out, "      // {}", describe(entry));
            if entry.prebuilt {
                out.push_str(" (prebuilt)");
            }
            out.push('\n');
            for class in &entry.classes {
                let _ = writeln!(out, "      {}.self,", class);
            }
        }
        out.push_str("    ]\n");
        out.push_str("  }\n");
        out.push_str("}\n");
        out
    }

    fn header(&self, out: &mut String, comment: &str) {
        let _ = writeln!(out, "{} {}", comment, GENERATED_MARKER);
        let _ = writeln!(out, "{} target: {}", comment, self.target());
        let _ = writeln!(out, "{} fingerprint: {}", comment, self.fingerprint());
        out.push('\n');
    }
}

fn describe(entry: &GlueEntry) -> String {
    match &entry.abi_suffix {
        Some(abi) => format!("{} {} ({}) {}", entry.name, entry.version, abi, entry.path),
        None => format!("{} {} {}", entry.name, entry.version, entry.path),
    }
}
