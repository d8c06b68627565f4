//! Bodies of the generated files.

use crate::config::ProjectLayout;
use crate::slug::pascal_case;

pub fn feature_module(layout: &ProjectLayout, screen: &str, component: &str, title: &str) -> String {
    let path = layout.relative(&layout.feature_module_path(screen)).display().to_string();
    format!(
        r#"// {path}
'use client'

import {{ View, Text }} from 'react-native'
import {{ useColorScheme }} from 'react-native'

export function {component}() {{
  const colorScheme = useColorScheme()

  return (
    <View style={{{{ flex: 1, alignItems: 'center', justifyContent: 'center', padding: 20, backgroundColor: colorScheme === 'dark' ? '#121212' : '#FFFFFF' }}}}>
      <Text style={{{{ fontSize: 24, marginBottom: 10, color: colorScheme === 'dark' ? 'white' : 'black' }}}}>
        {title}
      </Text>
      <Text style={{{{ fontSize: 12, color: colorScheme === 'dark' ? 'white' : 'black' }}}}>
        This screen was auto-generated by navsync.
      </Text>
    </View>
  )
}}
"#
    )
}

pub fn expo_route(layout: &ProjectLayout, screen: &str, component: &str) -> String {
    let path = layout.relative(&layout.expo_route_path(screen)).display().to_string();
    let import = layout.package_import_source(screen);
    let page = pascal_case(screen);
    format!(
        r#"// {path}
import {{ {component} }} from '{import}'

export default function {page}TabPage() {{
  return <{component} />
}}
"#
    )
}

pub fn next_route(layout: &ProjectLayout, screen: &str, component: &str) -> String {
    let path = layout.relative(&layout.next_route_path(screen)).display().to_string();
    let import = layout.package_import_source(screen);
    let page = pascal_case(screen);
    format!(
        r#"// {path}
'use client'

import {{ {component} }} from '{import}'

export default function {page}Page() {{
  return <{component} />
}}
"#
    )
}
