use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use cc_core::{Chunk, ChunkId, Language};
use cc_indexer::{Analyzer, IndexerError};

/// Reference analyzer used only by benchmarks and end-to-end tests: derives
/// `component_type`/`layer`/`framework`/`tags`/`symbol_path` from filename
/// and content conventions common to TypeScript/NestJS-style backends, so
/// fixture projects exercise the classifier/rescorer's component-shape rules
/// without depending on a real syntactic parser (out of scope, see
/// SPEC_FULL.md §1 Non-goals).
pub struct FixtureAnalyzer;

const SUFFIX_RULES: &[(&str, &str, &str)] = &[
    (".service.ts", "service", "backend"),
    (".controller.ts", "controller", "backend"),
    (".module.ts", "module", "backend"),
    (".guard.ts", "guard", "backend"),
    (".interceptor.ts", "interceptor", "backend"),
    (".middleware.ts", "middleware", "backend"),
    (".provider.ts", "provider", "backend"),
    (".config.ts", "config", "backend"),
    (".resolver.ts", "resolver", "backend"),
    (".component.tsx", "component", "frontend"),
];

impl Analyzer for FixtureAnalyzer {
    fn analyze(
        &self,
        relative_path: &str,
        absolute_path: &Path,
        content: &str,
    ) -> Result<Vec<Chunk>, IndexerError> {
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let line_count = content.lines().count().max(1) as u32;
        let language = absolute_path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
            .unwrap_or_else(|| Language::new("unknown"));

        let path_lower = relative_path.to_lowercase();
        let (component_type, layer) = SUFFIX_RULES
            .iter()
            .find(|(suffix, _, _)| path_lower.ends_with(suffix))
            .map(|(_, component_type, layer)| (Some(component_type.to_string()), Some(layer.to_string())))
            .unwrap_or((None, None));

        let mut tags = BTreeSet::new();
        if path_lower.contains(".test.") || path_lower.contains(".spec.") {
            tags.insert("test".to_string());
        }
        if path_lower.ends_with("app.module.ts")
            || path_lower.ends_with("main.ts")
            || path_lower.ends_with("bootstrap.ts")
        {
            tags.insert("composition-root".to_string());
        }

        let framework = if path_lower.ends_with(".tsx") || path_lower.ends_with(".component.ts") {
            Some("react".to_string())
        } else if component_type.is_some() {
            Some("nestjs".to_string())
        } else {
            None
        };

        let symbol_path = first_definition_name(content).map(|name| vec![name]);
        let imports = import_targets(content);

        let chunk = Chunk {
            id: ChunkId::derive(relative_path, 1, line_count),
            absolute_path: absolute_path.to_path_buf(),
            relative_path: relative_path.to_string(),
            start_line: 1,
            end_line: line_count,
            language,
            framework,
            component_type,
            layer,
            dependencies: Vec::new(),
            imports,
            exports: Vec::new(),
            tags,
            content: content.to_string(),
            symbol_path,
            component_name: file_stem(relative_path),
            complexity: None,
            embedding: None,
        };
        Ok(vec![chunk])
    }
}

const DEFINITION_KEYWORDS: &[&str] = &["class ", "interface ", "function ", "const "];

fn first_definition_name(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim_start();
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        for keyword in DEFINITION_KEYWORDS {
            if let Some(rest) = trimmed.strip_prefix(keyword) {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }
    None
}

fn import_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            if !trimmed.starts_with("import ") {
                return None;
            }
            let from_idx = trimmed.find("from ")?;
            let rest = &trimmed[from_idx + 5..];
            let quote = rest.chars().next()?;
            if quote != '\'' && quote != '"' {
                return None;
            }
            let rest = &rest[1..];
            let end = rest.find(quote)?;
            Some(rest[..end].to_string())
        })
        .collect()
}

fn file_stem(relative_path: &str) -> Option<String> {
    Path::new(relative_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// A small, realistic project: an auth flow (service/controller/guard), a
/// router module wired through `app.module.ts`, a config provider, and a
/// matching test file — enough surface for every intent/profile/rescoring
/// rule to fire at least once.
pub fn create_project(root: &Path) {
    let src = root.join("src");
    fs::create_dir_all(&src).unwrap();

    fs::write(
        src.join("auth.service.ts"),
        r#"
import { UserRepository } from './user.repository';

export class AuthService {
    constructor(private repo: UserRepository) {}

    login(user: string, password: string): boolean {
        return this.repo.verify(user, password);
    }

    logout(session: string): void {
        this.repo.invalidate(session);
    }
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("auth.controller.ts"),
        r#"
import { AuthService } from './auth.service';

export class AuthController {
    constructor(private auth: AuthService) {}

    handleLogin(req: any): any {
        return this.auth.login(req.body.user, req.body.password);
    }
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("auth.guard.ts"),
        r#"
export class AuthGuard {
    canActivate(session: string): boolean {
        return session.length > 0;
    }
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("auth.service.test.ts"),
        r#"
import { AuthService } from './auth.service';

describe('AuthService', () => {
    it('logs a user in', () => {
        expect(true).toBe(true);
    });
});
"#,
    )
    .unwrap();

    fs::write(
        src.join("app.router.ts"),
        r#"
export class AppRouter {
    navigate(path: string): void {
        console.log(`routing to ${path}`);
    }

    redirect(path: string): void {
        this.navigate(path);
    }
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("app.config.ts"),
        r#"
export class AppConfig {
    readonly port: number = 8080;
    readonly host: string = 'localhost';
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("app.module.ts"),
        r#"
import { AuthService } from './auth.service';
import { AuthController } from './auth.controller';
import { AppConfig } from './app.config';

export class AppModule {
    providers = [AuthService, AppConfig];
    controllers = [AuthController];
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("user.repository.ts"),
        r#"
export class UserRepository {
    verify(user: string, password: string): boolean {
        return password.length > 0;
    }

    invalidate(session: string): void {}
}
"#,
    )
    .unwrap();

    fs::write(
        src.join("button.component.tsx"),
        r#"
export function Button(props: { label: string }) {
    return props.label;
}
"#,
    )
    .unwrap();
}

/// Two files that mutually import each other, for cycle-detection coverage.
pub fn add_import_cycle(root: &Path) {
    let src = root.join("src");
    fs::write(
        src.join("cycle_a.service.ts"),
        r#"
import { CycleB } from './cycle_b.service';

export class CycleA {
    b: any;
}
"#,
    )
    .unwrap();
    fs::write(
        src.join("cycle_b.service.ts"),
        r#"
import { CycleA } from './cycle_a.service';

export class CycleB {
    a: any;
}
"#,
    )
    .unwrap();
}

/// A scaled-up project for benchmarking: `n` near-identical services per
/// shape, so indexing throughput can be measured independent of fixture
/// authoring cost.
pub fn create_scaled_project(root: &Path, services_per_shape: usize) {
    let src = root.join("src");
    fs::create_dir_all(&src).unwrap();

    for i in 0..services_per_shape {
        fs::write(
            src.join(format!("service_{i}.service.ts")),
            format!(
                r#"
export class Service{i} {{
    process(data: string): string {{
        return data + "{i}";
    }}

    validate(data: string): boolean {{
        return data.length > {i};
    }}
}}
"#
            ),
        )
        .unwrap();

        fs::write(
            src.join(format!("controller_{i}.controller.ts")),
            format!(
                r#"
import {{ Service{i} }} from './service_{i}.service';

export class Controller{i} {{
    constructor(private svc: Service{i}) {{}}

    handle(req: any): string {{
        return this.svc.process(req.body);
    }}
}}
"#
            ),
        )
        .unwrap();

        fs::write(
            src.join(format!("component_{i}.component.tsx")),
            format!(
                r#"
export function Widget{i}(props: {{ value: number }}) {{
    return props.value + {i};
}}
"#
            ),
        )
        .unwrap();
    }
}
