//! Initialize a new notebook

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::site::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Dev Notebook configuration

# Site
title: Dev Notebook
description: Your personal developer notebook where you can find and document various programming concepts and tutorials.
author: ''

# URL
root: /

# Directory
content_dir: content/concepts
public_dir: public
static_dir: static

# Home page
featured_limit: 5

# Footer
footer_links: []
#  - name: GitHub
#    url: https://github.com/your-name

# Code highlighting
highlight:
  theme: base16-ocean.dark
  line_number: false
"#;

const USE_STATE: &str = r#"---
title: useState
tags: [react, hooks]
---

# useState

`useState` gives a function component a piece of local state and a setter.
Calling the setter schedules a re-render with the new value.

```jsx
const [count, setCount] = useState(0);

<button onClick={() => setCount((prev) => prev - 1)}>Decrement</button>
<button onClick={() => setCount((prev) => prev + 1)}>Increment</button>
<button onClick={() => setCount(0)}>Reset</button>
```

## Functional updates

Pass a function to the setter when the next value depends on the previous
one. React calls it with the latest state, so rapid clicks are never lost.
"#;

const USE_EFFECT: &str = r#"---
title: useEffect
tags: [react, hooks]
---

# useEffect

`useEffect` runs a side effect after render. The dependency array decides
when it runs again.

```jsx
const [count, setCount] = useState(0);

useEffect(() => {
    document.title = `Count is ${count}`;
}, [count]);
```

## Dependencies

- No array: the effect runs after every render.
- `[]`: the effect runs once, after the first render.
- `[count]`: the effect runs whenever `count` changes.
"#;

/// Initialize a new notebook in the given directory
pub fn init_notebook(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("Notebook already initialized: {:?}", config_path);
    }

    let content_dir = target_dir.join("content/concepts");
    fs::create_dir_all(&content_dir)?;
    fs::create_dir_all(target_dir.join("static"))?;

    fs::write(&config_path, CONFIG_TEMPLATE)?;

    for (slug, body) in [("use-state", USE_STATE), ("use-effect", USE_EFFECT)] {
        let path = content_dir.join(format!("{}.md", slug));
        if !path.exists() {
            fs::write(&path, body)?;
            tracing::debug!("Created {:?}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Notebook;

    #[test]
    fn test_init_creates_loadable_notebook() {
        let dir = tempfile::tempdir().unwrap();
        init_notebook(dir.path()).unwrap();

        let notebook = Notebook::new(dir.path()).unwrap();
        assert_eq!(notebook.config.featured_limit, 5);

        let registry = notebook.registry().unwrap();
        let slugs: Vec<_> = registry.slugs().collect();
        assert_eq!(slugs, vec!["use-effect", "use-state"]);
    }

    #[test]
    fn test_init_refuses_existing_notebook() {
        let dir = tempfile::tempdir().unwrap();
        init_notebook(dir.path()).unwrap();
        assert!(init_notebook(dir.path()).is_err());
    }
}
