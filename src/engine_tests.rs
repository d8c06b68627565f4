#[cfg(test)]
mod tests {
    use crate::engine::{CycleOutcome, DirectCommand, SyncEngine};
    use crate::error::SyncError;
    use crate::fixtures::{
        with_autosave, with_draft, with_editing, with_pending, with_screen, Project, RecordingVcs,
        MANIFEST,
    };
    use crate::model::CommandSpec;
    use crate::plan::BatchKind;
    use crate::prompt::{Answer, ScriptedPrompter};
    use crate::state::Phase;
    use crate::vcs::{NoVcs, PendingChange, VersionControl};
    use crate::watch::ScriptedFeed;

    const SETTINGS_IMPORT: &str = "import { SettingsScreen } from '../settings/screen'";

    fn engine_with<V: VersionControl>(
        project: &Project,
        answers: Vec<Answer>,
        vcs: V,
        feed: ScriptedFeed,
    ) -> SyncEngine<ScriptedPrompter, V, ScriptedFeed> {
        let mut engine = SyncEngine::new(
            project.layout.clone(),
            ScriptedPrompter::new(answers),
            vcs,
            feed,
        );
        assert!(engine.initialize());
        engine
    }

    fn engine(
        project: &Project,
        answers: Vec<Answer>,
    ) -> SyncEngine<ScriptedPrompter, RecordingVcs, ScriptedFeed> {
        engine_with(project, answers, RecordingVcs::default(), ScriptedFeed::default())
    }

    fn baseline_names<P, V, F>(engine: &SyncEngine<P, V, F>) -> Vec<String> {
        engine
            .baseline()
            .map(|b| b.screens.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    const SETTINGS_FILES: [&str; 3] = [
        "packages/app/features/settings/screen.tsx",
        "apps/expo/app/(tabs)/settings.tsx",
        "apps/next/app/(tabs)/settings/page.tsx",
    ];

    // ═══════════════════════════════════════════════════════════════════════════
    // ADDITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_added_screen_is_projected_and_committed() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        let outcome = engine.on_notification();

        let CycleOutcome::Applied(files) = outcome else {
            panic!("expected Applied, got {:?}", outcome);
        };
        for file in SETTINGS_FILES {
            assert!(project.exists(file), "{} missing", file);
            assert!(files.contains(&project.root().join(file)));
        }
        assert!(project.manifest().contains(SETTINGS_IMPORT));
        assert_eq!(baseline_names(&engine), vec!["home", "account", "settings"]);

        let (message, paths) = &engine.vcs().commits[0];
        assert_eq!(message, "Add screens: settings");
        assert!(paths.contains(&project.layout.manifest_path()));
        assert_eq!(paths.len(), 4);
        // batch, four file operations, works?, commit?, message
        assert_eq!(engine.prompter().asked.len(), 8);
    }

    #[test]
    fn test_applied_paths_are_unique() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let manifest = with_screen(MANIFEST, "settings", "SettingsScreen", "Settings");
        project.write_manifest(&with_screen(&manifest, "stats", "StatsScreen", "Stats"));
        let CycleOutcome::Applied(files) = engine.on_notification() else {
            panic!("expected Applied");
        };

        let manifest_path = project.layout.manifest_path();
        assert_eq!(files.iter().filter(|p| **p == manifest_path).count(), 1);
        // six projection files plus the manifest
        assert_eq!(files.len(), 7);
    }

    #[test]
    fn test_declined_addition_step_rolls_back() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(
            &project,
            vec![Answer::Yes, Answer::Yes, Answer::Yes, Answer::No],
        );

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        let outcome = engine.on_notification();

        assert_eq!(outcome, CycleOutcome::Cancelled(BatchKind::Additions));
        for file in SETTINGS_FILES {
            assert!(!project.exists(file), "{} left behind", file);
        }
        assert!(!project.exists("packages/app/features/settings"));
        assert!(!project.manifest().contains(SETTINGS_IMPORT));
        assert_eq!(baseline_names(&engine), vec!["home", "account"]);
        assert!(engine.vcs().commits.is_empty());
        assert_eq!(engine.state().phase(), Phase::Idle);
    }

    #[test]
    fn test_rollback_removes_created_screen_directories() {
        let project = Project::new(MANIFEST);
        // batch, three generations, then refuse the import
        let mut engine = engine(
            &project,
            vec![Answer::Yes, Answer::Yes, Answer::Yes, Answer::Yes, Answer::No],
        );

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        assert_eq!(
            engine.on_notification(),
            CycleOutcome::Cancelled(BatchKind::Additions)
        );

        assert!(!project.exists("packages/app/features/settings"));
        assert!(!project.exists("apps/next/app/(tabs)/settings"));
        assert!(!project.exists(SETTINGS_FILES[1]));
        // the tabs group is shared by every screen
        assert!(project.exists("apps/expo/app/(tabs)"));
    }

    #[test]
    fn test_cancelled_batch_is_presented_again() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![Answer::Yes, Answer::No]);

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        engine.on_notification();
        let outcome = engine.on_notification();

        assert!(matches!(outcome, CycleOutcome::Applied(_)));
        assert!(project.exists(SETTINGS_FILES[0]));
    }

    #[test]
    fn test_completed_draft_is_added_with_import() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        project.write_manifest(&with_draft(MANIFEST, "settings"));
        assert_eq!(engine.on_notification(), CycleOutcome::NoChanges);
        assert!(engine.prompter().asked.is_empty());

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        let outcome = engine.on_notification();

        assert!(matches!(outcome, CycleOutcome::Applied(_)), "{:?}", outcome);
        assert!(project.manifest().contains(SETTINGS_IMPORT));
        for file in SETTINGS_FILES {
            assert!(project.exists(file), "{} missing", file);
        }
        assert!(engine.prompter().asked[1].starts_with("Confirm: Generate"));
        assert_eq!(engine.vcs().commits[0].0, "Add screens: settings");
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RENAMES & DELETIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn three_screen_project() -> Project {
        let manifest = with_screen(MANIFEST, "settings", "SettingsScreen", "Settings").replacen(
            "import { AccountScreen } from '../account/screen'\n",
            &format!(
                "import {{ AccountScreen }} from '../account/screen'\n{}\n",
                SETTINGS_IMPORT
            ),
            1,
        );
        let project = Project::new(&manifest);
        for screen in ["home", "account", "settings"] {
            project.seed_screen(screen);
        }
        project
    }

    #[test]
    fn test_rename_moves_projections_and_swaps_import() {
        let project = three_screen_project();
        let mut engine = engine(&project, vec![]);

        project.write_manifest(&project.manifest().replacen("name: 'account'", "name: 'profile'", 1));
        let outcome = engine.on_notification();
        assert!(matches!(outcome, CycleOutcome::Applied(_)), "{:?}", outcome);

        assert!(!project.exists("packages/app/features/account"));
        assert!(!project.exists("apps/expo/app/(tabs)/account.tsx"));
        assert!(!project.exists("apps/next/app/(tabs)/account"));
        assert!(project
            .read("apps/next/app/(tabs)/profile/page.tsx")
            .contains("export default function ProfilePage()"));
        assert!(project
            .read("packages/app/features/profile/screen.tsx")
            .contains("export function AccountScreen()"));

        let manifest = project.manifest();
        assert!(manifest.contains("import { AccountScreen } from '../profile/screen'"));
        assert!(!manifest.contains("'../account/screen'"));
        assert!(manifest.contains("import { HomeScreen } from '../home/screen'\n"));
        assert!(manifest.contains(SETTINGS_IMPORT));
        // untouched screens keep their files
        assert_eq!(project.read("apps/expo/app/(tabs)/home.tsx"), "// home\n");
        assert_eq!(project.read("apps/expo/app/(tabs)/settings.tsx"), "// settings\n");

        assert_eq!(baseline_names(&engine), vec!["home", "profile", "settings"]);
        assert_eq!(engine.vcs().commits[0].0, "Rename screens: account -> profile");
    }

    #[test]
    fn test_deleted_screen_loses_files_and_import() {
        let project = three_screen_project();
        let mut engine = engine(&project, vec![]);

        let account = "          {\n            name: 'account',\n            component: AccountScreen,\n            options: {\n              title: 'Account',\n              tabBarIconName: 'person',\n            },\n          },\n";
        let manifest = project.manifest();
        assert!(manifest.contains(account));
        project.write_manifest(&manifest.replacen(account, "", 1));

        assert!(matches!(engine.on_notification(), CycleOutcome::Applied(_)));
        assert!(!project.exists("packages/app/features/account"));
        assert!(!project.exists("apps/expo/app/(tabs)/account.tsx"));
        assert!(!project.exists("apps/next/app/(tabs)/account"));
        assert!(!project.manifest().contains("AccountScreen"));
        assert_eq!(engine.vcs().commits[0].0, "Delete screens: account");
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // GATING & DEFERRAL
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_editing_gate_blocks_all_work() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let edited = with_screen(MANIFEST, "settings", "SettingsScreen", "Settings");
        project.write_manifest(&with_editing(&edited, true));
        assert_eq!(engine.on_notification(), CycleOutcome::EditingGate);

        assert_eq!(engine.state().phase(), Phase::EditingGateOpen);
        assert!(engine.prompter().asked.is_empty());
        for file in SETTINGS_FILES {
            assert!(!project.exists(file));
        }
        assert_eq!(baseline_names(&engine), vec!["home", "account"]);

        // editing finished
        project.write_manifest(&edited);
        assert!(matches!(engine.on_notification(), CycleOutcome::Applied(_)));
        assert_eq!(engine.state().phase(), Phase::Idle);
    }

    #[test]
    fn test_editing_flag_ignored_without_autosave() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let edited = with_screen(MANIFEST, "settings", "SettingsScreen", "Settings");
        project.write_manifest(&with_autosave(&with_editing(&edited, true), false));
        assert!(matches!(engine.on_notification(), CycleOutcome::Applied(_)));
    }

    #[test]
    fn test_pending_commands_override_gate() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let manifest = with_pending(MANIFEST, "{ add: [{ name: 'Settings' }], delete: [] }");
        project.write_manifest(&with_editing(&manifest, true));
        let outcome = engine.on_notification();
        assert!(matches!(outcome, CycleOutcome::Applied(_)), "{:?}", outcome);

        let manifest = project.manifest();
        assert!(manifest.contains("export const pendingCommands = { add: [], delete: [] }"));
        assert!(manifest.contains("name: 'settings'"));
        assert!(manifest.contains("component: SettingsScreen"));
        assert!(manifest.contains(SETTINGS_IMPORT));
        for file in SETTINGS_FILES {
            assert!(project.exists(file));
        }
    }

    #[test]
    fn test_reserved_component_name_falls_back_to_default() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let manifest = with_pending(
            MANIFEST,
            "{ add: [{ name: 'settings', componentName: 'class' }], delete: [] }",
        );
        project.write_manifest(&manifest);
        let outcome = engine.on_notification();
        assert!(matches!(outcome, CycleOutcome::Applied(_)), "{:?}", outcome);

        let manifest = project.manifest();
        assert!(manifest.contains("export const pendingCommands = { add: [], delete: [] }"));
        assert!(manifest.contains("component: SettingsScreen"));
        assert!(!manifest.contains("component: class"));
    }

    #[test]
    fn test_own_write_is_ignored_once() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        engine.on_notification();
        assert!(engine.state().ignoring_next_change());

        assert_eq!(engine.on_notification(), CycleOutcome::IgnoredSelfWrite);
        assert_eq!(engine.on_notification(), CycleOutcome::NoChanges);
    }

    #[test]
    fn test_notification_during_prompt_is_deferred() {
        let project = Project::new(MANIFEST);
        let mut engine = engine_with(
            &project,
            vec![],
            RecordingVcs::default(),
            ScriptedFeed::new([true]),
        );

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        // the change queued during the batch prompt triggers a second cycle
        assert_eq!(engine.on_notification(), CycleOutcome::NoChanges);
        assert!(project.exists(SETTINGS_FILES[2]));
        assert!(!engine.state().reevaluate_after_completion());
    }

    #[test]
    fn test_batch_decline_retries_once() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![Answer::No, Answer::No]);

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        assert_eq!(engine.on_notification(), CycleOutcome::Declined);
        assert_eq!(engine.prompter().asked.len(), 2);
        assert_eq!(baseline_names(&engine), vec!["home", "account"]);

        assert!(matches!(engine.on_notification(), CycleOutcome::Applied(_)));
    }

    #[test]
    fn test_unparsable_manifest_waits() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        project.write_manifest(&MANIFEST[..MANIFEST.len() / 2]);
        assert_eq!(engine.on_notification(), CycleOutcome::Unparsable);
        assert!(engine.prompter().asked.is_empty());
        assert_eq!(baseline_names(&engine), vec!["home", "account"]);
    }

    #[test]
    fn test_first_good_read_becomes_baseline() {
        let project = Project::new("export const broken = [");
        let mut engine = SyncEngine::new(
            project.layout.clone(),
            ScriptedPrompter::default(),
            RecordingVcs::default(),
            ScriptedFeed::default(),
        );
        assert!(!engine.initialize());

        project.write_manifest(MANIFEST);
        assert_eq!(engine.on_notification(), CycleOutcome::BaselineEstablished);
        assert_eq!(baseline_names(&engine), vec!["home", "account"]);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VERSION CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    fn dirty_vcs(project: &Project) -> RecordingVcs {
        RecordingVcs {
            pending: vec![
                PendingChange {
                    path: project.root().join("README.md"),
                    status: " M".to_string(),
                },
                PendingChange {
                    path: project.layout.manifest_path(),
                    status: " M".to_string(),
                },
            ],
            commits: Vec::new(),
        }
    }

    #[test]
    fn test_preflight_without_message_aborts() {
        let project = Project::new(MANIFEST);
        let vcs = dirty_vcs(&project);
        let mut engine = engine_with(
            &project,
            vec![Answer::Yes, Answer::Yes, Answer::Text(String::new())],
            vcs,
            ScriptedFeed::default(),
        );

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        assert_eq!(engine.on_notification(), CycleOutcome::Aborted);
        assert!(!project.exists(SETTINGS_FILES[0]));
        assert_eq!(baseline_names(&engine), vec!["home", "account"]);
    }

    #[test]
    fn test_preflight_commits_other_changes_first() {
        let project = Project::new(MANIFEST);
        let vcs = dirty_vcs(&project);
        let mut engine = engine_with(
            &project,
            vec![Answer::Yes, Answer::Yes, Answer::Text("wip".to_string())],
            vcs,
            ScriptedFeed::default(),
        );

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        assert!(matches!(engine.on_notification(), CycleOutcome::Applied(_)));
        assert_eq!(
            engine.vcs().commits[0],
            ("wip".to_string(), vec![project.root().join("README.md")])
        );
        assert_eq!(engine.vcs().commits.len(), 2);
    }

    #[test]
    fn test_disabled_vcs_skips_commit_prompts() {
        let project = Project::new(MANIFEST);
        let mut engine = engine_with(&project, vec![], NoVcs, ScriptedFeed::default());

        project.write_manifest(&with_screen(MANIFEST, "settings", "SettingsScreen", "Settings"));
        assert!(matches!(engine.on_notification(), CycleOutcome::Applied(_)));
        assert_eq!(engine.prompter().asked.len(), 5);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DIRECT MODE
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_direct_add() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let command = CommandSpec {
            name: "Settings".to_string(),
            component_name: Some("SettingsScreen".to_string()),
            ..Default::default()
        };
        let outcome = engine.apply_direct(&DirectCommand::Add(command)).unwrap();
        let CycleOutcome::Applied(files) = outcome else {
            panic!("expected Applied, got {:?}", outcome);
        };
        assert!(files.contains(&project.root().join(SETTINGS_FILES[1])));
        assert!(project.manifest().contains("tabBarIconName: 'settings'"));
        assert!(project.manifest().contains(SETTINGS_IMPORT));
        assert_eq!(engine.state().phase(), Phase::Idle);
    }

    #[test]
    fn test_direct_delete() {
        let project = three_screen_project();
        let mut engine = engine(&project, vec![]);

        let outcome = engine
            .apply_direct(&DirectCommand::Delete(CommandSpec::named("Settings")))
            .unwrap();
        assert!(matches!(outcome, CycleOutcome::Applied(_)));
        assert!(!project.exists(SETTINGS_FILES[0]));
        assert!(!project.manifest().contains("SettingsScreen"));
    }

    #[test]
    fn test_direct_errors() {
        let project = Project::new(MANIFEST);
        let mut engine = engine(&project, vec![]);

        let err = engine
            .apply_direct(&DirectCommand::Delete(CommandSpec::named("ghost")))
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownScreen(_)));

        let err = engine
            .apply_direct(&DirectCommand::Add(CommandSpec::named("home")))
            .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateScreen(_)));
        assert_eq!(project.manifest(), MANIFEST);
    }
}
