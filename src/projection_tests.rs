#[cfg(test)]
mod tests {
    use std::fs;

    use crate::fixtures::{Project, MANIFEST};
    use crate::model::ScreenEntry;
    use crate::projection::{Projection, Projector};
    use crate::prompt::{Answer, ScriptedPrompter};

    fn settings() -> ScreenEntry {
        ScreenEntry::new("settings", "SettingsScreen").with_title("Settings")
    }

    #[test]
    fn test_generate_writes_all_three_targets() {
        let project = Project::new(MANIFEST);
        let projector = Projector::new(&project.layout);
        let mut prompter = ScriptedPrompter::default();

        for projection in Projection::ALL {
            let written = projector
                .generate(projection, &settings(), false, &mut prompter)
                .unwrap();
            assert_eq!(written, Some(projector.target_path(projection, "settings")));
        }

        assert!(project
            .read("packages/app/features/settings/screen.tsx")
            .contains("export function SettingsScreen()"));
        assert!(project
            .read("apps/expo/app/(tabs)/settings.tsx")
            .contains("export default function SettingsTabPage()"));
        assert!(project
            .read("apps/next/app/(tabs)/settings/page.tsx")
            .contains("import { SettingsScreen } from 'app/features/settings/screen'"));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_existing_file_defaults_to_keep_on_addition() {
        let project = Project::new(MANIFEST);
        project.seed_screen("settings");
        let projector = Projector::new(&project.layout);
        let mut prompter = ScriptedPrompter::new([Answer::Default]);

        let written = projector
            .generate(Projection::ExpoRoute, &settings(), false, &mut prompter)
            .unwrap();
        assert_eq!(written, None);
        assert_eq!(project.read("apps/expo/app/(tabs)/settings.tsx"), "// settings\n");
        assert!(prompter.asked[0].contains("already exists"));
    }

    #[test]
    fn test_existing_file_defaults_to_overwrite_on_update() {
        let project = Project::new(MANIFEST);
        project.seed_screen("settings");
        let projector = Projector::new(&project.layout);
        let mut prompter = ScriptedPrompter::new([Answer::Default]);

        let written = projector
            .generate(Projection::ExpoRoute, &settings(), true, &mut prompter)
            .unwrap();
        assert!(written.is_some());
        assert!(project
            .read("apps/expo/app/(tabs)/settings.tsx")
            .contains("SettingsTabPage"));
    }

    #[test]
    fn test_remove_is_quiet_when_absent() {
        let project = Project::new(MANIFEST);
        let projector = Projector::new(&project.layout);
        for projection in Projection::ALL {
            assert_eq!(projector.remove(projection, "ghost").unwrap(), None);
        }
    }

    #[test]
    fn test_remove_cleans_empty_screen_directories() {
        let project = Project::new(MANIFEST);
        project.seed_screen("account");
        let projector = Projector::new(&project.layout);

        for projection in Projection::ALL {
            assert!(projector.remove(projection, "account").unwrap().is_some());
        }
        assert!(!project.exists("packages/app/features/account"));
        assert!(!project.exists("apps/next/app/(tabs)/account"));
        assert!(!project.exists("apps/expo/app/(tabs)/account.tsx"));
        // the shared tabs directory stays
        assert!(project.exists("apps/expo/app/(tabs)"));
    }

    #[test]
    fn test_remove_keeps_directory_with_other_files() {
        let project = Project::new(MANIFEST);
        project.seed_screen("account");
        let extra = project.layout.feature_dir("account").join("styles.ts");
        fs::write(&extra, "export {}\n").unwrap();

        let projector = Projector::new(&project.layout);
        projector.remove(Projection::FeatureModule, "account").unwrap();
        assert!(extra.exists());
    }

    #[test]
    fn test_rename_moves_and_regenerates() {
        let project = Project::new(MANIFEST);
        project.seed_screen("account");
        let projector = Projector::new(&project.layout);
        let old = ScreenEntry::new("account", "AccountScreen");
        let new = ScreenEntry::new("profile", "AccountScreen").with_title("Profile");
        let mut prompter = ScriptedPrompter::default();

        for projection in Projection::ALL {
            let touched = projector.rename(projection, &old, &new, &mut prompter).unwrap();
            assert!(touched.contains(&projector.target_path(projection, "profile")));
            assert!(touched.contains(&projector.target_path(projection, "account")));
        }

        assert!(!project.exists("packages/app/features/account"));
        assert!(!project.exists("apps/expo/app/(tabs)/account.tsx"));
        assert!(!project.exists("apps/next/app/(tabs)/account"));
        assert!(project
            .read("apps/expo/app/(tabs)/profile.tsx")
            .contains("export default function ProfileTabPage()"));
        assert!(project
            .read("packages/app/features/profile/screen.tsx")
            .contains("export function AccountScreen()"));
        // the moved file is overwritten under the update default
        assert_eq!(prompter.asked.len(), 3);
    }
}
